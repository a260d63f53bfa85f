use clap::Parser;
use miette::Result;
use stockmap::cli::commands;
use stockmap::cli::{Cli, Commands};

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

    // RUST_LOG overrides the level picked from the flags
    let level = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Upload(args) => commands::upload::run(args, &global),
        Commands::Preview(args) => commands::upload::run_preview(args, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Map(args) => commands::map::run(args, &global),
        Commands::Divergences(args) => commands::list::run_divergences(args, &global),
        Commands::Damaged(args) => commands::list::run_damaged(args, &global),
        Commands::Restock(cmd) => commands::restock::run(cmd, &global),
        Commands::History(args) => commands::history::run(args, &global),
        Commands::Status(args) => commands::status::run(args, &global),
        Commands::Reset(args) => commands::reset::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
