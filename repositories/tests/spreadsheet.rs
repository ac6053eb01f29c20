use hoops_core::intake::{FormSubmission, intake};
use hoops_core::model::Hoop;
use hoops_core::result::RepoError;
use hoops_core::{HoopSaver, replicate};
use mockito::{Matcher, Mock, Server, ServerGuard};
use repositories::file::FileRepo;
use repositories::spreadsheet::SpreadsheetRepo;
use repositories::spreadsheet::feed::{DiscoveryError, LIST_FEED_REL, POST_REL};
use rstest::rstest;

const KEY: &str = "sheetkey";
const WORKSHEETS_PATH: &str = "/worksheets/sheetkey/private/full";
const LIST_PATH: &str = "/list/sheetkey/od6/private/full";

fn worksheets_feed(base: &str, with_list_link: bool) -> String {
    let list_link = if with_list_link {
        format!(
            r#"<link rel="{LIST_FEED_REL}" type="application/atom+xml" href="{base}{LIST_PATH}"/>"#
        )
    } else {
        String::new()
    };

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gs="http://schemas.google.com/spreadsheets/2006">
  <title type="text">Hoops</title>
  <link rel="self" type="application/atom+xml" href="{base}{WORKSHEETS_PATH}"/>
  <entry>
    <title type="text">Sheet1</title>
    {list_link}
    <link rel="http://schemas.google.com/spreadsheets/2006#cellsfeed" type="application/atom+xml" href="{base}/cells/sheetkey/od6/private/full"/>
    <gs:colCount>10</gs:colCount>
  </entry>
</feed>"#
    )
}

fn list_feed(base: &str, with_post_link: bool) -> String {
    let post_link = if with_post_link {
        format!(r#"<link rel="{POST_REL}" type="application/atom+xml" href="{base}{LIST_PATH}"/>"#)
    } else {
        String::new()
    };

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gsx="http://schemas.google.com/spreadsheets/2006/extended">
  <title type="text">Sheet1</title>
  <link rel="http://schemas.google.com/g/2005#feed" type="application/atom+xml" href="{base}{LIST_PATH}"/>
  {post_link}
</feed>"#
    )
}

async fn mock_worksheets(server: &mut ServerGuard, with_list_link: bool) -> Mock {
    let body = worksheets_feed(&server.url(), with_list_link);
    server
        .mock("GET", WORKSHEETS_PATH)
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_list(server: &mut ServerGuard, with_post_link: bool) -> Mock {
    let body = list_feed(&server.url(), with_post_link);
    server
        .mock("GET", LIST_PATH)
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(body)
        .create_async()
        .await
}

fn repo(server: &ServerGuard) -> SpreadsheetRepo {
    SpreadsheetRepo::new(reqwest::Client::new(), KEY).with_feeds_url(server.url())
}

fn court_a() -> Hoop {
    intake(
        FormSubmission::new()
            .with_field("location", "Court A")
            .with_field("lat", "41.8")
            .with_field("lng", "-87.6")
            .with_field("story", "Great hoop")
            .with_field("contact-ok", "true"),
    )
    .unwrap()
}

fn discovery_error(err: &error_stack::Report<RepoError>) -> DiscoveryError {
    err.downcast_ref::<DiscoveryError>()
        .cloned()
        .expect("error should carry a discovery error")
}

#[tokio::test]
async fn inserts_row_at_discovered_post_url() {
    let mut server = Server::new_async().await;
    let worksheets = mock_worksheets(&mut server, true).await;
    let list = mock_list(&mut server, true).await;
    let hoop = court_a();
    let insert = server
        .mock("POST", LIST_PATH)
        .match_header("content-type", "application/atom+xml")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(format!("<gsx:id>{}</gsx:id>", hoop.id())),
            Matcher::Regex("<gsx:location>Court A</gsx:location>".into()),
            Matcher::Regex("<gsx:contactok>true</gsx:contactok>".into()),
        ]))
        .with_status(201)
        .create_async()
        .await;

    repo(&server).save(&hoop).await.unwrap();

    worksheets.assert_async().await;
    list.assert_async().await;
    insert.assert_async().await;
}

#[tokio::test]
async fn missing_list_feed_link_inserts_nothing() {
    let mut server = Server::new_async().await;
    let _worksheets = mock_worksheets(&mut server, false).await;
    let list = server
        .mock("GET", LIST_PATH)
        .expect(0)
        .create_async()
        .await;
    let insert = server
        .mock("POST", LIST_PATH)
        .expect(0)
        .create_async()
        .await;

    let err = repo(&server).save(&court_a()).await.unwrap_err();

    assert!(matches!(err.current_context(), RepoError::Save));
    assert_eq!(
        DiscoveryError::MissingRelation(LIST_FEED_REL),
        discovery_error(&err)
    );
    list.assert_async().await;
    insert.assert_async().await;
}

#[tokio::test]
async fn missing_post_link_inserts_nothing() {
    let mut server = Server::new_async().await;
    let _worksheets = mock_worksheets(&mut server, true).await;
    let _list = mock_list(&mut server, false).await;
    let insert = server
        .mock("POST", LIST_PATH)
        .expect(0)
        .create_async()
        .await;

    let err = repo(&server).save(&court_a()).await.unwrap_err();

    assert_eq!(DiscoveryError::MissingRelation(POST_REL), discovery_error(&err));
    insert.assert_async().await;
}

#[tokio::test]
async fn worksheet_index_out_of_range() {
    let mut server = Server::new_async().await;
    let _worksheets = mock_worksheets(&mut server, true).await;

    let err = repo(&server)
        .with_worksheet_index(1)
        .save(&court_a())
        .await
        .unwrap_err();

    assert_eq!(DiscoveryError::MissingWorksheet(1), discovery_error(&err));
}

#[rstest]
#[case(401)]
#[case(404)]
#[case(500)]
#[tokio::test]
async fn worksheets_feed_error_status_aborts(#[case] status: usize) {
    let mut server = Server::new_async().await;
    let _worksheets = server
        .mock("GET", WORKSHEETS_PATH)
        .with_status(status)
        .create_async()
        .await;

    let err = repo(&server).save(&court_a()).await.unwrap_err();

    assert_eq!(DiscoveryError::Status(status as u16), discovery_error(&err));
}

#[tokio::test]
async fn malformed_feed_aborts() {
    let mut server = Server::new_async().await;
    let _worksheets = server
        .mock("GET", WORKSHEETS_PATH)
        .with_status(200)
        .with_body("<feed><entry></feed>")
        .create_async()
        .await;

    let err = repo(&server).save(&court_a()).await.unwrap_err();

    assert_eq!(DiscoveryError::MalformedFeed, discovery_error(&err));
}

#[tokio::test]
async fn rejected_insert_is_an_error() {
    let mut server = Server::new_async().await;
    let _worksheets = mock_worksheets(&mut server, true).await;
    let _list = mock_list(&mut server, true).await;
    let _insert = server
        .mock("POST", LIST_PATH)
        .with_status(403)
        .create_async()
        .await;

    let err = repo(&server).save(&court_a()).await.unwrap_err();

    assert!(matches!(err.current_context(), RepoError::Save));
    assert_eq!(DiscoveryError::Status(403), discovery_error(&err));
}

#[tokio::test]
async fn replicates_saved_local_record() {
    let dir = tempfile::tempdir().unwrap();
    let files = FileRepo::new(dir.path());
    let hoop = court_a();
    files.save(&hoop).await.unwrap();

    let mut server = Server::new_async().await;
    let _worksheets = mock_worksheets(&mut server, true).await;
    let _list = mock_list(&mut server, true).await;
    let insert = server
        .mock("POST", LIST_PATH)
        .match_body(Matcher::Regex(format!("<gsx:id>{}</gsx:id>", hoop.id())))
        .with_status(201)
        .create_async()
        .await;

    let replicated = replicate(&files, &hoop.storage_key(), &repo(&server))
        .await
        .unwrap();

    assert_eq!(hoop.attributes(), &replicated);
    insert.assert_async().await;
}
