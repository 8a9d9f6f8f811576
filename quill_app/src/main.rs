use quill_app::{app::App, config::Config};

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::parse();
    let db = quill_db::Db::init(&config.database_url).await?;

    quill_app::serve(App::new(config, db)).await?;

    Ok(())
}
