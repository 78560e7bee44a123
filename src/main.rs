use clap::Parser;
use miette::Result;
use creq::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    creq::core::logging::setup_tracing(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => creq::cli::commands::init::run(args),
        Commands::Ref(cmd) => creq::cli::commands::reference::run(cmd, &global),
        Commands::Order(cmd) => creq::cli::commands::order::run(cmd, &global),
        Commands::Backup(cmd) => creq::cli::commands::backup::run(cmd, &global),
        Commands::Sync(args) => creq::cli::commands::sync::run(args, &global),
        Commands::Config(cmd) => creq::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => creq::cli::commands::completions::run(args),
    }
}
