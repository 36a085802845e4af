//! REST round-trips through a real listener: the axum router on one side,
//! the client's `ApiClient` on the other.

mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use common::Harness;
use ripple::backend::routes::create_router;
use ripple::client::{ApiClient, ClientError};

async fn serve(h: &Harness) -> ApiClient {
    let app = create_router(h.app_state());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ApiClient::new(format!("http://{}", addr))
}

#[tokio::test]
async fn send_then_fetch_history_over_http() {
    let h = Harness::new();
    let client = serve(&h).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let mut conversation_id = None;
    for i in 0..3 {
        let sent = client
            .send_message(alice, bob, format!("m{}", i))
            .await
            .unwrap();
        assert!(!sent.id.is_nil());
        conversation_id = Some(sent.conversation_id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    // Page size 2 forces the client through its paging loop; the result is
    // display order, oldest first.
    let history = client
        .fetch_history(conversation_id.unwrap(), 2)
        .await
        .unwrap();
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m0", "m1", "m2"]);
}

#[tokio::test]
async fn invalid_send_surfaces_api_error() {
    let h = Harness::new();
    let client = serve(&h).await;
    let alice = Uuid::new_v4();

    let result = client.send_message(alice, alice, "x").await;
    assert_matches!(result, Err(ClientError::Api { status: 400, .. }));
}

#[tokio::test]
async fn history_of_unknown_conversation_is_empty() {
    let h = Harness::new();
    let client = serve(&h).await;

    let page = client
        .fetch_history_page(Uuid::new_v4(), 0, 50)
        .await
        .unwrap();
    assert!(page.messages.is_empty());
    assert!(!page.has_more);
}
