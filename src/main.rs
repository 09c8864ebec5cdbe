use clap::{CommandFactory, Parser};

use vfio_usb::backend;
use vfio_usb::cli::{Cli, Command};
use vfio_usb::config;
use vfio_usb::error::VfioError;
use vfio_usb::hotplug;
use vfio_usb::logging;
use vfio_usb::udev;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.log_file.as_deref());

    // No subcommand: show usage and exit cleanly, without touching the config
    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(|e| VfioError::Io {
            context: "printing help".into(),
            source: e,
        })?;
        return Ok(());
    };

    let config = config::load_config(&cli.config)?;

    match command {
        Command::Add(args) => {
            let backend = backend::create_backend(cli.virsh, cli.connect);
            hotplug::attach(&config, &backend, &args.usb_id())?;
        }
        Command::Remove(args) => {
            let backend = backend::create_backend(cli.virsh, cli.connect);
            hotplug::detach(&config, &backend, &args.usb_id())?;
        }
        Command::Udev => {
            let program = udev::self_invocation(&config)?;
            print!("{}", udev::generate_udev_rules(&config, &program)?);
        }
    }

    Ok(())
}
