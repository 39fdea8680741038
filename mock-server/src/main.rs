use mock_server::{MockState, DEMO_EMAIL};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");

    let state = MockState::new();
    state
        .seed_list(
            "Groceries",
            vec![
                json!({"id": "1", "name": "Milch", "quantity": "2", "checked": false, "isChecked": false}),
                json!({"id": "2", "name": "Brot", "category": "Backwaren", "checked": true, "isChecked": true}),
            ],
        )
        .await;

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, user = DEMO_EMAIL, "mock SwipeList API listening");
    mock_server::run(listener, state).await
}
