use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use axum_test::multipart::{MultipartForm, Part};
use error_stack::Report;
use hoops_core::model::{Hoop, HoopAttributes};
use hoops_core::result::{NotifyError, RepoError, RepoResult};
use hoops_core::{HoopEngine, HoopReader, HoopSaver, Notifier};
use hoops_routes::routes::{self, HOOPS_PATH};
use hoops_routes::state::HoopAppState;
use repositories::file::FileRepo;
use rstest::{fixture, rstest};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

#[derive(Clone)]
struct TestEngine {
    files: FileRepo,
    fail_records: bool,
    notifications: mpsc::UnboundedSender<HoopAttributes>,
}

#[derive(Clone)]
struct Records {
    files: FileRepo,
    fail: bool,
}

impl HoopSaver for Records {
    async fn save(&self, hoop: &Hoop) -> RepoResult<()> {
        if self.fail {
            return Err(Report::new(RepoError::Save));
        }
        self.files.save(hoop).await
    }
}

#[derive(Clone)]
struct ChannelNotifier(mpsc::UnboundedSender<HoopAttributes>);

impl Notifier for ChannelNotifier {
    async fn notify(&self, hoop: &HoopAttributes) -> Result<(), Report<NotifyError>> {
        self.0
            .send(hoop.clone())
            .map_err(|_| Report::new(NotifyError))
    }
}

impl HoopEngine for TestEngine {
    type Records = Records;
    type Media = FileRepo;
    type Notifier = ChannelNotifier;

    fn records(&self) -> Self::Records {
        Records {
            files: self.files.clone(),
            fail: self.fail_records,
        }
    }

    fn media(&self) -> Self::Media {
        self.files.clone()
    }

    fn notifier(&self) -> Option<Self::Notifier> {
        Some(ChannelNotifier(self.notifications.clone()))
    }
}

struct Context {
    dir: TempDir,
    files: FileRepo,
    server: TestServer,
    notifications: mpsc::UnboundedReceiver<HoopAttributes>,
}

impl Context {
    fn new(fail_records: bool) -> Self {
        let dir = tempfile::tempdir().expect("temp dir created");
        let files = FileRepo::new(dir.path());
        let (tx, notifications) = mpsc::unbounded_channel();
        let engine = TestEngine {
            files: files.clone(),
            fail_records,
            notifications: tx,
        };
        let router = routes::build(HoopAppState::new_without_metrics(engine));

        Self {
            dir,
            files,
            server: TestServer::new(router).expect("test server created"),
            notifications,
        }
    }

    fn saved_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[fixture]
fn context() -> Context {
    Context::new(false)
}

fn court_a() -> MultipartForm {
    MultipartForm::new()
        .add_text("location", "Court A")
        .add_text("lat", "41.8")
        .add_text("lng", "-87.6")
        .add_text("story", "Great hoop")
        .add_text("contact-ok", "true")
        .add_text("email", "a@b.com")
        .add_text("phone", "555-1212")
}

#[rstest]
#[tokio::test]
async fn submission_without_image_is_saved(context: Context) {
    let before = Utc::now();
    let response = context.server.post(HOOPS_PATH).multipart(court_a()).await;
    let after = Utc::now();

    assert_eq!(StatusCode::OK, response.status_code());
    let hoop: HoopAttributes = response.json();
    assert!(!hoop.id.to_string().is_empty());
    assert!(
        before <= hoop.created && hoop.created <= after,
        "created {} is the submission time",
        hoop.created
    );
    assert_eq!("Court A", hoop.location);
    assert_eq!(41.8, hoop.lat);
    assert_eq!(-87.6, hoop.lng);
    assert_eq!("Great hoop", hoop.story);
    assert!(hoop.contact_ok);
    assert_eq!("a@b.com", hoop.email);
    assert_eq!("555-1212", hoop.phone);
    assert_eq!("", hoop.image);

    let record_file = format!("{}.json", hoop.storage_key());
    assert_eq!(vec![record_file.clone()], context.saved_files());

    let contents = std::fs::read_to_string(context.dir.path().join(&record_file)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(hoop.id.to_string(), json["Id"]);
    assert_eq!("Court A", json["Location"]);
    assert_eq!(41.8, json["Lat"]);
    assert_eq!(-87.6, json["Lng"]);
    assert_eq!("Great hoop", json["Story"]);
    assert_eq!(true, json["ContactOk"]);
    assert_eq!("a@b.com", json["Email"]);
    assert_eq!("555-1212", json["Phone"]);
    assert_eq!("", json["Image"]);

    let saved = context.files.read(&hoop.storage_key()).await.unwrap();
    assert_eq!(hoop, saved, "response matches the saved record");
}

#[rstest]
#[tokio::test]
async fn submission_with_png_saves_image(context: Context) {
    let form = court_a().add_part(
        "image",
        Part::bytes(b"\x89PNG\r\n".to_vec())
            .file_name("hoop.png")
            .mime_type("image/png"),
    );

    let response = context.server.post(HOOPS_PATH).multipart(form).await;

    assert_eq!(StatusCode::OK, response.status_code());
    let hoop: HoopAttributes = response.json();
    let key = hoop.storage_key();
    assert_eq!(format!("{key}.png"), hoop.image);
    assert_eq!(
        vec![format!("{key}.json"), format!("{key}.png")],
        context.saved_files()
    );
    assert_eq!(
        b"\x89PNG\r\n".to_vec(),
        std::fs::read(context.dir.path().join(&hoop.image)).unwrap()
    );
}

#[rstest]
#[tokio::test]
async fn unsupported_image_is_dropped(context: Context) {
    let form = court_a().add_part(
        "image",
        Part::bytes(b"GIF89a".to_vec())
            .file_name("hoop.gif")
            .mime_type("image/gif"),
    );

    let response = context.server.post(HOOPS_PATH).multipart(form).await;

    assert_eq!(StatusCode::OK, response.status_code());
    let hoop: HoopAttributes = response.json();
    assert_eq!("", hoop.image);
    assert_eq!(vec![format!("{}.json", hoop.storage_key())], context.saved_files());
}

#[rstest]
#[tokio::test]
async fn unreadable_fields_are_ignored(context: Context) {
    let form = MultipartForm::new()
        .add_text("location", "Court B")
        .add_text("lat", "north")
        .add_text("contact-ok", "maybe")
        .add_text("favorite-color", "blue");

    let response = context.server.post(HOOPS_PATH).multipart(form).await;

    assert_eq!(StatusCode::OK, response.status_code());
    let hoop: HoopAttributes = response.json();
    assert_eq!("Court B", hoop.location);
    assert_eq!(0.0, hoop.lat);
    assert!(!hoop.contact_ok);
}

#[rstest]
#[tokio::test]
async fn non_multipart_request_is_rejected(context: Context) {
    let response = context
        .server
        .post(HOOPS_PATH)
        .json(&serde_json::json!({ "location": "Court A" }))
        .expect_failure()
        .await;

    assert_eq!(StatusCode::BAD_REQUEST, response.status_code());
    assert_eq!(
        "Request must be encoded as multipart/form-data",
        response.text()
    );
    assert!(context.saved_files().is_empty(), "nothing is saved");
}

#[rstest]
#[tokio::test]
async fn oversized_body_is_too_large(context: Context) {
    let form = court_a().add_part(
        "image",
        Part::bytes(vec![0u8; 33 * 1024 * 1024])
            .file_name("huge.png")
            .mime_type("image/png"),
    );

    let response = context
        .server
        .post(HOOPS_PATH)
        .multipart(form)
        .expect_failure()
        .await;

    assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, response.status_code());
    assert!(context.saved_files().is_empty(), "nothing is saved");
}

#[tokio::test]
async fn record_failure_is_a_server_error() {
    let context = Context::new(true);

    let response = context
        .server
        .post(HOOPS_PATH)
        .multipart(court_a())
        .expect_failure()
        .await;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status_code());
    assert_eq!("Error saving hoop", response.text());
}

#[rstest]
#[tokio::test]
async fn saved_hoop_is_announced(mut context: Context) {
    let response = context.server.post(HOOPS_PATH).multipart(court_a()).await;
    let hoop: HoopAttributes = response.json();

    let notified = tokio::time::timeout(Duration::from_secs(5), context.notifications.recv())
        .await
        .expect("notification sent in time")
        .expect("notification channel open");

    assert_eq!(hoop.id, notified.id);
}

#[tokio::test]
async fn failed_save_is_not_announced() {
    let mut context = Context::new(true);

    context
        .server
        .post(HOOPS_PATH)
        .multipart(court_a())
        .expect_failure()
        .await;

    assert!(context.notifications.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn metrics_disabled_is_unavailable(context: Context) {
    let response = context.server.get("/metrics").expect_failure().await;

    assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status_code());
}

#[rstest]
#[tokio::test]
async fn api_docs_describe_hoop_submission(context: Context) {
    let response = context.server.get("/api/0.1/api-docs/openapi.json").await;

    assert_eq!(StatusCode::OK, response.status_code());
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"][HOOPS_PATH]["post"].is_object());
}

