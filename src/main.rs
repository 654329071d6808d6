mod defaults;
mod error;
mod ioreg;
mod keys;
mod logging;
mod remap;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use defaults::{Defaults, PreferenceStore};
use error::UsageError;
use ioreg::{Ioreg, Keyboard, KeyboardSource};
use remap::{RemapEntry, RemapTable};
use rich_rust::markup;
use rich_rust::prelude::*;
use rich_rust::r#box::ROUNDED;
use tracing::warn;

#[derive(Parser)]
#[command(name = "modmap")]
#[command(version)]
#[command(about = "Remap modifier keys on every attached keyboard (macOS)")]
#[command(
    long_about = "Remap modifier keys on every attached keyboard (macOS).\n\nReads each keyboard's modifier mapping from the per-host global defaults, merges in the requested remap (replacing any existing mapping for the same source key) and writes it back. Log out and back in for the change to take effect."
)]
struct Cli {
    /// Remap to apply, e.g. "caps:control_l" (see --list-keys)
    #[arg(
        value_name = "SOURCE:DEST",
        required_unless_present_any = ["list_keys", "completions"]
    )]
    remap: Option<String>,

    /// Show the merged mapping without writing it
    #[arg(long)]
    dry_run: bool,

    /// Continue with the remaining keyboards when one fails
    #[arg(long)]
    keep_going: bool,

    /// Show current and new mappings and enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List the available key names and exit
    #[arg(long)]
    list_keys: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    dry_run: bool,
    keep_going: bool,
    verbose: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    remapped: usize,
    failed: usize,
}

struct Remapper<S, P> {
    console: Console,
    source: S,
    store: P,
    options: Options,
}

impl<S: KeyboardSource, P: PreferenceStore> Remapper<S, P> {
    fn new(source: S, store: P, options: Options) -> Self {
        Self {
            console: Console::new(),
            source,
            store,
            options,
        }
    }

    fn run(&self, entry: RemapEntry) -> Result<Summary> {
        let keyboards = self
            .source
            .list_keyboards()
            .context("Failed to enumerate keyboards")?;

        if keyboards.is_empty() {
            self.console
                .print("[bold #e74c3c]✗[/] [bold white]Found no keyboards![/]");
            return Ok(Summary::default());
        }

        self.print_keyboards(&keyboards);
        self.console.print(&format!(
            "  [dim]Remap:[/] [bold #f1c40f]{}[/] → [bold #2ecc71]{}[/]{}",
            entry.src,
            entry.dst,
            if self.options.dry_run {
                "  [dim](dry run)[/]"
            } else {
                ""
            }
        ));
        self.console.print("");

        let mut summary = Summary::default();
        for (i, keyboard) in keyboards.iter().enumerate() {
            self.console.print(&format!(
                "  [bold #3498db]►[/] [bold white]{:>3}[/]  [dim]vendor[/] {}  [dim]product[/] {}",
                i, keyboard.vendor_id, keyboard.product_id
            ));

            match self.remap_keyboard(keyboard, entry) {
                Ok(()) => {
                    summary.remapped += 1;
                    if self.options.dry_run {
                        self.console.print("       [#95a5a6]not written (dry run)[/]");
                    } else {
                        self.console
                            .print("       [bold #2ecc71]✓[/] remapped successfully");
                    }
                }
                Err(e) if self.options.keep_going => {
                    summary.failed += 1;
                    warn!(keyboard = i, error = %format!("{:#}", e), "skipping keyboard");
                    self.console.print(&format!(
                        "       [bold #e74c3c]✗[/] [#e74c3c]{:#}[/]",
                        e
                    ));
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Failed to remap keyboard {} (vendor {}, product {})",
                        i, keyboard.vendor_id, keyboard.product_id
                    )));
                }
            }
        }

        self.console.print("");
        if summary.remapped > 0 && !self.options.dry_run {
            self.console.print(
                "  [bold #f39c12]You'll need to logout before changes will take effect.[/]",
            );
        }

        if summary.failed > 0 {
            bail!(
                "{} of {} keyboards could not be remapped",
                summary.failed,
                keyboards.len()
            );
        }
        Ok(summary)
    }

    fn remap_keyboard(&self, keyboard: &Keyboard, entry: RemapEntry) -> Result<()> {
        let current = self
            .store
            .read(keyboard)
            .context("Failed to read modifier mapping")?;
        let merged = remap::merge(&current, entry);

        if self.options.verbose || self.options.dry_run {
            self.print_table("current", &current);
            self.print_table("new", &merged);
        }
        if self.options.dry_run {
            return Ok(());
        }

        self.store
            .write(keyboard, &merged)
            .context("Failed to write modifier mapping")
    }

    fn print_keyboards(&self, keyboards: &[Keyboard]) {
        self.console.print("[bold #3498db]Found keyboards:[/]");

        let mut table = Table::new()
            .box_style(&ROUNDED)
            .header_style(Style::parse("bold #f1c40f").unwrap_or_default())
            .border_style(Style::parse("#3498db").unwrap_or_default())
            .with_column(Column::new("#"))
            .with_column(Column::new("Name"))
            .with_column(Column::new("Vendor"))
            .with_column(Column::new("Product"));

        for (i, keyboard) in keyboards.iter().enumerate() {
            table.add_row_cells([
                markup::render_or_plain(&i.to_string()),
                markup::render_or_plain(&keyboard.name),
                markup::render_or_plain(&keyboard.vendor_id.to_string()),
                markup::render_or_plain(&keyboard.product_id.to_string()),
            ]);
        }

        self.console.print_renderable(&table);
        self.console.print("");
    }

    fn print_table(&self, label: &str, table: &RemapTable) {
        if table.is_empty() {
            self.console
                .print(&format!("       [dim]{} map:[/] [#95a5a6](empty)[/]", label));
        }
        for e in table {
            self.console.print(&format!(
                "       [dim]{} map:[/] {} => {}",
                label, e.src, e.dst
            ));
        }
    }
}

fn print_usage(console: &Console) {
    console.print(
        "You must supply exactly one remap specification in the format '<Source>:<Dest>'.",
    );
    print_key_names(console);
}

fn print_key_names(console: &Console) {
    console.print("Available key names are:");
    for (name, code) in keys::names() {
        console.print(&format!("  - [bold]{}[/] [dim]({})[/]", name, code.0));
    }
}

fn run(cli: Cli, console: &Console) -> Result<()> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "modmap", &mut std::io::stdout());
        return Ok(());
    }

    if cli.list_keys {
        print_key_names(console);
        return Ok(());
    }

    let remap = cli.remap.context("Missing remap argument")?;
    let entry = keys::parse_remap(&remap)?;

    let options = Options {
        dry_run: cli.dry_run,
        keep_going: cli.keep_going,
        verbose: cli.verbose,
    };
    Remapper::new(Ioreg::default(), Defaults::default(), options).run(entry)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            // Nothing more to report if stderr itself is gone.
            e.print().ok();
            print_usage(&Console::new());
            std::process::exit(1);
        }
    };

    logging::init(cli.verbose);
    let console = Console::new();

    if let Err(err) = run(cli, &console) {
        if err.downcast_ref::<UsageError>().is_some() {
            print_usage(&console);
        }
        return Err(err);
    }
    Ok(())
}
