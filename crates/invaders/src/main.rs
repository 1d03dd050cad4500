use invaders::USAGE;

fn main() {
    env_logger::init();

    let config = match invaders::parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "{err:#}\n{USAGE}\n\
                 for example: invaders assets/roms/space_invaders/invaders.rom 600 --paced"
            );
            std::process::exit(1);
        }
    };

    log::info!("Playing ROM path: '{}'", config.rom_path.display());
    if let Err(err) = invaders::run(config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
