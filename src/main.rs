use std::io::Read;

use clarity::ai::{self, GeminiClient};
use clarity::config::ClarityConfig;
use clarity::core::calendar::{self, YearMonth};
use clarity::render;
use clarity::store::{DocumentStore, Outcome};

const USAGE: &str = "\
usage: clarity <command> [args]

  calendar [YYYY-MM] [--prev|--next]...   show a month grid
  months                                  list month options
  years [YEAR]                            list year options around YEAR
  dump [FILE|-]                           organize a brain dump (stdin by default)
  tasks                                   show task cards
  plan                                    show the weekly plan
  done <ID> | undo <ID>                   mark a task (id prefix accepted)
  delete <ID>                             delete a task and its plan entries
  clear-done                              delete all done tasks
  clear                                   delete everything
  set-key <KEY> | check-key | forget-key  manage the Gemini API key
";

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn init_logging(config: &ClarityConfig) {
    // Journal logging (`journalctl --user -t clarity -f`): clarity targets at
    // info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("clarity") {
                let max = if clarity::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    clarity::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("clarity".to_string()),
        Err(e) => {
            eprintln!("journal logging unavailable: {}", e);
            return;
        }
    };

    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn parse_year_month(arg: &str) -> Option<YearMonth> {
    let (year, month) = arg.split_once('-')?;
    Some(YearMonth::new(year.parse().ok()?, month.parse().ok()?))
}

fn open_store(config: &ClarityConfig) -> Result<DocumentStore, Box<dyn std::error::Error>> {
    config.ensure_dirs()?;
    Ok(DocumentStore::open(config.document_path())?)
}

fn show_calendar(config: &ClarityConfig, args: &[String]) -> CliResult {
    let mut ym = YearMonth::today();
    for arg in args {
        match arg.as_str() {
            "--prev" => ym = ym.navigate(-1),
            "--next" => ym = ym.navigate(1),
            other => {
                ym = parse_year_month(other).ok_or_else(|| format!("expected YYYY-MM, got {:?}", other))?
            }
        }
    }

    let busy = DocumentStore::open(config.document_path())?.document().plan().busy_days();
    let today = chrono::Local::now().date_naive();
    print!("{}", render::month_grid(ym, &busy, today));
    Ok(())
}

async fn organize(config: &ClarityConfig, args: &[String]) -> CliResult {
    let content = match args.first().map(String::as_str) {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    if content.trim().is_empty() {
        return Err("nothing to organize: the brain dump is empty".into());
    }

    let mut store = open_store(config)?;
    let api_key = ai::keyring::resolve_api_key().await?;
    let client = GeminiClient::from_config(config, api_key);
    let today = chrono::Local::now().date_naive();

    let response = client.organize(&content, today).await?;
    let added = store.document_mut().apply_response(response);
    store.save()?;

    println!("Brain dump processed! {} new tasks.\n", added);
    print!("{}", render::task_list(&store.document().tasks));
    Ok(())
}

fn report(outcome: Outcome, updated: &str, unchanged: &str) {
    match outcome {
        Outcome::Updated => println!("{}", updated),
        Outcome::Unchanged => println!("{}", unchanged),
    }
}

async fn run(config: &ClarityConfig, command: &str, args: &[String]) -> CliResult {
    match command {
        "calendar" => show_calendar(config, args)?,
        "months" => {
            for option in calendar::month_dropdown_options() {
                println!("{:>2}  {}", option.value, option.label);
            }
        }
        "years" => {
            let year = match args.first() {
                Some(arg) => arg.parse::<i32>()?,
                None => YearMonth::today().year(),
            };
            for option in calendar::year_dropdown_options(year) {
                println!("{}", option.label);
            }
        }
        "dump" => organize(config, args).await?,
        "tasks" => print!("{}", render::task_list(&open_store(config)?.document().tasks)),
        "plan" => print!("{}", render::weekly_plan(open_store(config)?.document().plan())),
        "done" | "undo" => {
            let needle = args.first().ok_or("missing task id")?;
            let mut store = open_store(config)?;
            let id = store.document().find_task_id(needle)?;
            let outcome = store.document_mut().set_completed(id, command == "done")?;
            store.save()?;
            report(outcome, "Task updated!", "Task is unchanged, no updates made");
        }
        "delete" => {
            let needle = args.first().ok_or("missing task id")?;
            let mut store = open_store(config)?;
            let id = store.document().find_task_id(needle)?;
            let task = store.document_mut().delete_task(id)?;
            store.save()?;
            println!("Task deleted: {}", task.title);
        }
        "clear-done" => {
            let mut store = open_store(config)?;
            let outcome = store.document_mut().delete_done_tasks();
            store.save()?;
            report(outcome, "All done tasks deleted!", "No done tasks to delete");
        }
        "clear" => {
            let mut store = open_store(config)?;
            store.document_mut().clear_all();
            store.save()?;
            println!("All data cleared.");
        }
        "set-key" => {
            let key = args.first().ok_or("missing API key")?;
            ai::keyring::store_api_key(key).await?;
            println!("API key stored.");
        }
        "forget-key" => {
            ai::keyring::delete_api_key().await?;
            println!("API key removed from keyring.");
        }
        "check-key" => {
            let client = GeminiClient::from_config(config, ai::keyring::resolve_api_key().await?);
            client.test_api_key().await?;
            println!("API key valid for {}.", client.model());
        }
        "help" | "-h" | "--help" => print!("{}", USAGE),
        other => return Err(format!("unknown command {:?}\n\n{}", other, USAGE).into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult {
    let config = ClarityConfig::load();
    init_logging(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => ("calendar", &[][..]),
    };

    let result = run(&config, command, rest).await;
    if let Err(e) = &result {
        log::error!("{} failed: {}", command, e);
    }
    result
}
