/*
[INPUT]:  ZAPLINK_API_KEY / ZAPLINK_SECRET_KEY / ZAPLINK_APP_ID env vars
[OUTPUT]: Auth URL from the login-initiation endpoint
[POS]:    Examples - login handshake demonstration
[UPDATE]: When the login flow or configuration surface changes
*/

use std::env;

use zaplink_sdk::*;

/// Example: Login handshake
///
/// 1. Build a configuration from environment variables
/// 2. Create a client with file-backed session storage
/// 3. Initiate login and print the auth URL
/// 4. The identity provider later redirects back with a callback token,
///    which you pass to `Zaplink::handle_auth_callback`
#[tokio::main]
async fn main() {
    let config = ZaplinkConfig::new(
        env::var("ZAPLINK_API_KEY").unwrap_or_default(),
        env::var("ZAPLINK_SECRET_KEY").unwrap_or_default(),
        env::var("ZAPLINK_APP_ID").unwrap_or_default(),
    )
    .with_callback_url("https://myapp.example.com/callback");

    let client = match Zaplink::with_storage(config, Box::new(FileStorage::new("./.zaplink-session"))) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ Zaplink client created");

    let _on_error = client.on(ZaplinkEvent::AuthError, |data| {
        if let EventData::Error(message) = data {
            eprintln!("auth error: {message}");
        }
    });

    if client.is_authenticated() {
        println!("✓ Resumed persisted session");
        if let Some(user) = client.get_user() {
            println!("  Logged in as {} (balance {})", user.username, user.balance);
        }
        return;
    }

    match client.login().await {
        Ok(response) => {
            println!("✓ Auth URL received");
            println!("  Open this URL to continue login:");
            println!("  {}", response.auth_url.unwrap_or_default());
            println!("  Then call client.handle_auth_callback(callback_token)");
        }
        Err(e) => eprintln!("Login initiation failed: {}", e),
    }
}
