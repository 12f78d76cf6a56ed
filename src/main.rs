use vitrine::{AppConfig, run};

fn main() -> vitrine::Result<()> {
    env_logger::init();
    run(AppConfig::default())
}
