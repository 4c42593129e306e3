use clap::Parser;
use dotenvy::dotenv;
use log::error;
use loyalty_server::{
    cli::{display_envs, Arguments},
    config::ServerConfig,
    server::run_server,
};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    if args.print_env {
        display_envs();
        return;
    }
    let config = match ServerConfig::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            error!("🪛️ {e}");
            eprintln!("{e}");
            std::process::exit(1);
        },
    };
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
