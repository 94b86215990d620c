use http_client::native::NativeClient;
use spotify_history_sync::auth::code_from_redirect;
use spotify_history_sync::config::{PathsConfig, SpotifyConfig};
use spotify_history_sync::{SpotifyAuth, TokenPersistence};
use std::io::{self, BufRead, Write};

pub async fn handle_authorize_command(paths: &PathsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = SpotifyConfig::from_env()?;
    let auth = SpotifyAuth::new(Box::new(NativeClient::new()), config);

    println!("Open this URL in your browser and grant access:\n");
    println!("  {}\n", auth.authorize_url()?);
    print!("Paste the URL you were redirected to: ");
    io::stdout().flush()?;

    let mut redirect = String::new();
    io::stdin().lock().read_line(&mut redirect)?;
    let code = code_from_redirect(redirect.trim())?;

    let token = auth.exchange_code(&code).await?;
    let persistence = TokenPersistence::new(&paths.token_cache);
    persistence.save(&token)?;

    log::info!("Token cached at {}", persistence.path().display());
    println!("✅ Authorized. You can now run `spotify-history-sync extract`.");
    Ok(())
}
