use server::config::PaginationConfig;

use crate::common::{TestApp, UploadFields};

async fn seed(app: &TestApp, post_type: &str, count: usize) -> Vec<i32> {
    let author = app.create_user(&format!("{post_type}-author")).await;
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(app.create_post(author, post_type, &format!("Entry {i}")).await);
    }
    ids
}

#[tokio::test]
async fn home_renders_home_template() {
    let app = TestApp::spawn().await;

    let res = app.get("/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["template"], "home.html");
}

#[tokio::test]
async fn list_pages_use_type_templates() {
    let app = TestApp::spawn().await;

    for (path, template) in [
        ("/posts/", "post_list.html"),
        ("/guestbooks/", "guestbook_list.html"),
        ("/portfolios/", "portfolio_list.html"),
    ] {
        let res = app.get(path).await;
        assert_eq!(res.status, 200, "{path}: {}", res.text);
        assert_eq!(res.body["template"], template);
        assert_eq!(res.body["page"]["number"], 1);
        assert_eq!(res.body["page"]["num_pages"], 1);
    }
}

#[tokio::test]
async fn htmx_requests_get_partial_template() {
    let app = TestApp::spawn().await;

    let res = app.get_htmx("/guestbooks/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["template"], "guestbook_list_partial.html");
}

#[tokio::test]
async fn lists_only_show_their_own_type() {
    let app = TestApp::spawn().await;
    seed(&app, "post", 2).await;
    let guestbook = seed(&app, "guestbook", 1).await;

    let res = app.get("/guestbooks/").await;
    let items = res.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], guestbook[0]);
}

#[tokio::test]
async fn blog_pages_hold_ten_posts_newest_first() {
    let app = TestApp::spawn().await;
    let ids = seed(&app, "post", 12).await;

    let first = app.get("/posts/").await;
    assert_eq!(first.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["items"][0]["id"], *ids.last().unwrap());
    assert_eq!(first.body["page"]["num_pages"], 2);
    assert_eq!(first.body["page"]["has_next"], true);

    let last = app.get("/posts/?page=last").await;
    assert_eq!(last.body["page"]["number"], 2);
    assert_eq!(last.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(last.body["items"][1]["id"], ids[0]);
}

#[tokio::test]
async fn portfolio_pages_hold_eight_items() {
    let app = TestApp::spawn().await;
    seed(&app, "portfolio", 9).await;

    let res = app.get("/portfolios/").await;
    assert_eq!(res.body["items"].as_array().unwrap().len(), 8);
    assert_eq!(res.body["page"]["per_page"], 8);
    assert_eq!(res.body["page"]["num_pages"], 2);
}

#[tokio::test]
async fn long_ranges_are_elided() {
    let app = TestApp::spawn_with_page_sizes(PaginationConfig {
        post_page_size: 1,
        portfolio_page_size: 1,
    })
    .await;
    seed(&app, "post", 20).await;

    let res = app.get("/posts/?page=10").await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        res.body["page"]["page_range"],
        serde_json::json!([1, 2, "…", 7, 8, 9, 10, 11, 12, 13, "…", 19, 20])
    );
}

#[tokio::test]
async fn invalid_page_returns_404() {
    let app = TestApp::spawn().await;
    seed(&app, "post", 3).await;

    assert_eq!(app.get("/posts/?page=2").await.status, 404);
    assert_eq!(app.get("/posts/?page=abc").await.status, 404);
}

#[tokio::test]
async fn detail_includes_comments_and_attachments() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "portfolio", "Gallery").await;
    app.create_comment(post, author, "Nice").await;
    app.upload_attachment(post, "a.png", b"a".to_vec(), UploadFields::default())
        .await;

    let res = app.get(&format!("/posts/{post}")).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["template"], "post_detail.html");
    assert_eq!(res.body["post"]["id"], post);
    assert_eq!(res.body["comments"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["attachments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn trashed_post_detail_returns_404() {
    let app = TestApp::spawn().await;
    let author = app.create_user("author").await;
    let post = app.create_post(author, "post", "Gone").await;
    app.delete(&format!("/api/v1/posts/{post}")).await;

    assert_eq!(app.get(&format!("/posts/{post}")).await.status, 404);
}
