//! Focused unit tests covering CLI configuration and command execution.

use super::helpers::{memory_repository, utf8_root, write_utf8};
use super::*;
use crate::posts::{
    AddConfig, DeleteConfig, ENV_ADD_PHOTO, ENV_DELETE_AUTHOR, ENV_NEARBY_CATEGORY,
    ENV_REVIEWS_STORE, NearbyConfig, ReviewsConfig,
};
use crate::search::{ENV_SEARCH_KAKAO_KEY, SearchConfig};
use rstest::rstest;
use scoop_core::test_support::{StubKeywordSearch, sample_jpeg, sample_post};
use scoop_core::{
    Document, DocumentStore, GeoPoint, KeywordSearchResult, Place, PostCategory, PostKey,
};
use tempfile::TempDir;

fn assert_missing(err: CliError, expected_field: &str, expected_env: &str) {
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, expected_field);
            assert_eq!(env, expected_env);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

fn nearby_args() -> NearbyArgs {
    NearbyArgs {
        category: Some("cafe".to_owned()),
        latitude: Some(37.5665),
        longitude: Some(126.9780),
        ..NearbyArgs::default()
    }
}

#[rstest]
fn nearby_requires_a_category() {
    let args = NearbyArgs {
        category: None,
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("missing category should error");
    assert_missing(err, ARG_CATEGORY, ENV_NEARBY_CATEGORY);
}

#[rstest]
fn nearby_defaults_radius_and_storage() {
    let config = NearbyConfig::try_from(nearby_args()).expect("config builds");
    assert_eq!(config.category, PostCategory::Cafe);
    assert!((config.radius_km - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.storage.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.storage.blob_root, Utf8PathBuf::from(DEFAULT_BLOB_ROOT));
}

#[rstest]
fn nearby_rejects_unknown_categories() {
    let args = NearbyArgs {
        category: Some("bakery-ish".to_owned()),
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("unknown category");
    assert!(matches!(err, CliError::UnknownCategory(_)), "got {err:?}");
}

#[rstest]
#[case(91.0, 0.0)]
#[case(0.0, 181.0)]
fn nearby_rejects_invalid_coordinates(#[case] latitude: f64, #[case] longitude: f64) {
    let args = NearbyArgs {
        latitude: Some(latitude),
        longitude: Some(longitude),
        ..nearby_args()
    };
    let err = NearbyConfig::try_from(args).expect_err("invalid coordinate");
    assert!(matches!(err, CliError::InvalidCoordinate(_)), "got {err:?}");
}

#[rstest]
fn reviews_requires_a_store() {
    let args = ReviewsArgs {
        category: Some("cafe".to_owned()),
        ..ReviewsArgs::default()
    };
    let err = ReviewsConfig::try_from(args).expect_err("missing store should error");
    assert_missing(err, ARG_STORE, ENV_REVIEWS_STORE);
}

#[rstest]
fn add_requires_a_photo() {
    let args = AddArgs {
        author: Some("user-1".to_owned()),
        store: Some("Blue Bottle".to_owned()),
        category: Some("cafe".to_owned()),
        latitude: Some(37.5404),
        longitude: Some(126.9497),
        ..AddArgs::default()
    };
    let err = AddConfig::try_from(args).expect_err("missing photo should error");
    assert_missing(err, ARG_PHOTO, ENV_ADD_PHOTO);
}

#[rstest]
fn add_builds_a_post_without_image() {
    let args = AddArgs {
        author: Some("user-1".to_owned()),
        store: Some("Blue Bottle".to_owned()),
        category: Some("cafe".to_owned()),
        latitude: Some(37.5404),
        longitude: Some(126.9497),
        content: Some("Great pour-over".to_owned()),
        photo: Some(Utf8PathBuf::from("photo.jpg")),
        ..AddArgs::default()
    };
    let config = AddConfig::try_from(args).expect("config builds");
    assert_eq!(config.post.author_uid, "user-1");
    assert_eq!(config.post.content, "Great pour-over");
    assert_eq!(config.post.address, "");
    assert_eq!(config.post.post_image, None);
}

#[rstest]
fn delete_requires_an_author() {
    let args = DeleteArgs {
        store: Some("Blue Bottle".to_owned()),
        category: Some("cafe".to_owned()),
        ..DeleteArgs::default()
    };
    let err = DeleteConfig::try_from(args).expect_err("missing author should error");
    assert_missing(err, ARG_AUTHOR, ENV_DELETE_AUTHOR);
}

#[rstest]
fn search_requires_an_api_key() {
    let args = SearchArgs {
        query: Some("카페".to_owned()),
        latitude: Some(37.5665),
        longitude: Some(126.9780),
        ..SearchArgs::default()
    };
    let err = SearchConfig::try_from(args).expect_err("missing key should error");
    assert_missing(err, ARG_KAKAO_KEY, ENV_SEARCH_KAKAO_KEY);
}

#[rstest]
#[case(None, 1_000)]
#[case(Some(500), 500)]
#[case(Some(50_000), 20_000)]
fn search_radius_is_defaulted_and_capped(#[case] radius: Option<u32>, #[case] expected: u32) {
    let args = SearchArgs {
        query: Some("카페".to_owned()),
        latitude: Some(37.5665),
        longitude: Some(126.9780),
        radius,
        kakao_key: Some("secret".to_owned()),
        ..SearchArgs::default()
    };
    let config = SearchConfig::try_from(args).expect("config builds");
    assert_eq!(config.radius, expected);
    assert!(!format!("{config:?}").contains("secret"));
}

#[rstest]
fn search_forwards_the_centre_as_strings() {
    let result = KeywordSearchResult {
        documents: vec![Place {
            place_name: "Blue Bottle".to_owned(),
            ..Place::default()
        }],
        ..KeywordSearchResult::default()
    };
    let stub = StubKeywordSearch::with_result(result.clone());
    let config = SearchConfig {
        query: "카페".to_owned(),
        center: GeoPoint::new(37.5, 127.25).expect("valid point"),
        radius: 700,
        kakao_key: String::new(),
    };
    let found = runtime()
        .expect("runtime")
        .block_on(search::execute_search(&stub, &config))
        .expect("search succeeds");
    assert_eq!(found, result);
    let requests = stub.requests();
    let request = requests.first().expect("one request");
    assert_eq!(request.query, "카페");
    assert_eq!(request.longitude, "127.25");
    assert_eq!(request.latitude, "37.5");
    assert_eq!(request.radius, 700);
}

#[rstest]
#[case(ARG_DATABASE, "reviews.db")]
#[case(ARG_BLOB_ROOT, "photos")]
fn search_takes_no_storage_options(#[case] flag: &str, #[case] value: &str) {
    let long_flag = format!("--{flag}");
    let err = Cli::try_parse_from([
        "scoop",
        "search",
        "카페",
        "--latitude",
        "37.5",
        "--longitude",
        "127.0",
        long_flag.as_str(),
        value,
    ])
    .expect_err("search has no storage flags");
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[rstest]
fn nearby_and_reviews_list_stored_posts() {
    let repository = memory_repository();
    let runtime = runtime().expect("runtime");
    let post = sample_post("user-1", "Blue Bottle", PostCategory::Cafe, 37.5665, 126.9780);
    runtime
        .block_on(repository.add_post(&post, &sample_jpeg()))
        .expect("add succeeds");

    let nearby = NearbyConfig::try_from(nearby_args()).expect("config builds");
    let around = runtime
        .block_on(posts::execute_nearby(&repository, &nearby))
        .expect("nearby succeeds");
    assert_eq!(around.len(), 1);

    let reviews = ReviewsConfig {
        store: "Blue Bottle".to_owned(),
        category: PostCategory::Cafe,
        storage: StorageConfig::resolve(None, None),
    };
    let listed = runtime
        .block_on(posts::execute_reviews(&repository, &reviews))
        .expect("reviews succeed");
    assert_eq!(
        listed.first().map(|found| found.author_uid.as_str()),
        Some("user-1")
    );
}

#[rstest]
fn deleting_a_missing_review_reports_false() {
    let repository = memory_repository();
    let config = DeleteConfig {
        author: "nobody".to_owned(),
        store: "Blue Bottle".to_owned(),
        category: PostCategory::Cafe,
        storage: StorageConfig::resolve(None, None),
    };
    let outcome = runtime()
        .expect("runtime")
        .block_on(posts::execute_delete(&repository, &config))
        .expect("delete succeeds");
    assert!(!outcome.deleted);
}

#[rstest]
fn deleting_an_undecodable_review_removes_it() {
    let repository = memory_repository();
    let runtime = runtime().expect("runtime");
    let key = PostKey::new(PostCategory::Cafe, "Blue Bottle", "user-1").expect("valid key");
    let path = key.document_path();
    runtime
        .block_on(repository.documents().set_document(
            &path,
            serde_json::json!({"authorUid": "user-1", "location": "somewhere"}),
        ))
        .expect("write corrupt review");
    let config = DeleteConfig {
        author: "user-1".to_owned(),
        store: "Blue Bottle".to_owned(),
        category: PostCategory::Cafe,
        storage: StorageConfig::resolve(None, None),
    };
    let outcome = runtime
        .block_on(posts::execute_delete(&repository, &config))
        .expect("delete succeeds");
    assert!(outcome.deleted);
    let remaining: Option<Document> = runtime
        .block_on(repository.documents().get_document(&path))
        .expect("read succeeds");
    assert_eq!(remaining, None);
}

#[rstest]
fn deleting_with_a_slash_in_the_store_name_is_rejected() {
    let config = DeleteConfig {
        author: "user-1".to_owned(),
        store: "Blue/Bottle".to_owned(),
        category: PostCategory::Cafe,
        storage: StorageConfig::resolve(None, None),
    };
    let err = runtime()
        .expect("runtime")
        .block_on(posts::execute_delete(&memory_repository(), &config))
        .expect_err("invalid key");
    assert!(matches!(err, CliError::InvalidKey(_)), "got {err:?}");
}

#[rstest]
fn reading_a_missing_photo_errors() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_root(&tmp).join("missing.jpg");
    let err = read_source_file(&path, ARG_PHOTO).expect_err("missing photo");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_PHOTO),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn reading_an_existing_photo_returns_its_bytes() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_root(&tmp).join("photo.jpg");
    write_utf8(&path, &[0xFF, 0xD8, 0xFF, 0xD9]);
    let bytes = read_source_file(&path, ARG_PHOTO).expect("photo reads");
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xD9]);
}

#[rstest]
fn json_output_ends_with_a_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &posts::DeleteOutcome { deleted: true }).expect("write output");
    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert_eq!(text, "{\n  \"deleted\": true\n}\n");
}

#[rstest]
fn cli_parses_global_log_level_after_subcommand() {
    let cli = Cli::try_parse_from([
        "scoop",
        "reviews",
        "--store",
        "Blue Bottle",
        "--log-level",
        "debug",
    ])
    .expect("arguments parse");
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    match cli.command {
        Command::Reviews(args) => assert_eq!(args.store.as_deref(), Some("Blue Bottle")),
        other => panic!("expected reviews, found {other:?}"),
    }
}
