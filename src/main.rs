use clap::{Parser, Subcommand};
use image_sorter::config::{self, AppConfig};
use image_sorter::controller::{Controller, FilePicker, InputEvent, Key, Response};
use image_sorter::imaging::RustBackend;
use image_sorter::types::{Point, Size};
use image_sorter::{output, project};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "image-sorter")]
#[command(about = "Keyboard-driven triage of image batches into class folders")]
#[command(long_about = "\
Keyboard-driven triage of image batches into class folders

Each project is a folder with a manifest and one subfolder per class:

  ~/ImageSorterProjects/
  └── birds/
      ├── project.json     # name, classes, settings
      ├── unsorted/        # import pool: images waiting to be sorted
      ├── finches/
      └── owls/

Run without a subcommand for the interactive session. On the sorting
screen each line is one input: 0 sends back to unsorted, 1-9 send to the
Nth class, an empty line or 'n' skips, 'drag x1 y1 x2 y2' selects a crop.
Type 'help' there for the full list.

Run 'image-sorter gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (default: the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Override `projects_root` from the config
    #[arg(long, global = true)]
    projects_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List projects
    List,
    /// Create a project
    New {
        name: String,
        /// Class names; "unsorted" is always added
        classes: Vec<String>,
    },
    /// Copy images (or folders of images) into a project's unsorted pool
    Add {
        project: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let app_config = config::load_app_config(cli.config_dir.as_deref())?;
    init_logging(&app_config)?;
    let projects_root = cli
        .projects_root
        .clone()
        .unwrap_or_else(|| app_config.projects_root_path());

    match cli.command {
        None => run_interactive(&app_config, &projects_root)?,
        Some(Command::List) => {
            output::print_project_list(&project::list_projects(&projects_root)?);
        }
        Some(Command::New { name, classes }) => {
            let root = project::project_root(&projects_root, &name)?;
            let created = project::create(&root, &name, &classes)?;
            println!("Created {} at {}", created.name, created.root.display());
            println!("Classes: {}", created.classes.join(", "));
        }
        Some(Command::Add { project: name, files }) => {
            let root = project::project_root(&projects_root, &name)?;
            let target = project::load(&root)?;
            let files = project::collect_image_files(&files)?;
            let report = project::import_images(&target, &files)?;
            println!("{}", output::format_import(report.imported.len()));
            for (source, reason) in &report.failed {
                eprintln!("warning: {}", output::format_import_failure(source, reason));
            }
        }
        Some(Command::GenConfig) => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

/// Level from `[logging] level`; `RUST_LOG` wins when set.
fn init_logging(app_config: &AppConfig) -> Result<(), config::ConfigError> {
    let level = app_config.logging.level_filter()?;
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
    Ok(())
}

// ============================================================================
// Interactive session
// ============================================================================

/// Read one line from stdin without the trailing newline. `None` at EOF.
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    if !prompt.is_empty() {
        print!("{prompt}");
        io::stdout().flush()?;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// File picker that asks for paths on stdin, one per line.
struct PromptPicker;

impl FilePicker for PromptPicker {
    fn choose_files(&mut self) -> Vec<PathBuf> {
        println!("Image files or folders, one per line. Blank line to finish:");
        let mut chosen = Vec::new();
        while let Ok(Some(line)) = read_line("  + ") {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            chosen.push(PathBuf::from(line));
        }
        match project::collect_image_files(&chosen) {
            Ok(files) => files,
            Err(e) => {
                log::error!("{e}");
                Vec::new()
            }
        }
    }
}

const HOME_HELP: &[&str] = &[
    "list                      list projects",
    "open <name>               start sorting a project",
    "new <name> [classes...]   create a project",
    "quit",
];

const SORT_HELP: &[&str] = &[
    "0-9                       send to class (0 = unsorted)",
    "<enter> | n               next image, nothing moved",
    "send <class>              send to a class by name",
    "rename <text>             name for the output file (blank = keep)",
    "drag x1 y1 x2 y2          select a crop in viewport coordinates",
    "press|move|release x y    single pointer events",
    "resize w h                set the viewport size",
    "add                       import images into unsorted",
    "info | keys               image details / key bindings",
    "back | quit",
];

fn run_interactive(
    app_config: &AppConfig,
    projects_root: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Projects in {}", projects_root.display());
    output::print_project_list(&project::list_projects(projects_root)?);

    while let Some(line) = read_line("> ")? {
        let mut words = line.split_whitespace();
        match words.next() {
            None => {}
            Some("list" | "ls") => {
                output::print_project_list(&project::list_projects(projects_root)?);
            }
            Some("open") => {
                let Some(name) = words.next() else {
                    println!("usage: open <name>");
                    continue;
                };
                let opened = project::project_root(projects_root, name).and_then(|r| project::load(&r));
                match opened {
                    Ok(p) => {
                        if sort_project(p, app_config)? == Exit::Quit {
                            return Ok(());
                        }
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
            Some("new") => {
                let Some(name) = words.next() else {
                    println!("usage: new <name> [classes...]");
                    continue;
                };
                let classes: Vec<&str> = words.collect();
                let created = project::project_root(projects_root, name)
                    .and_then(|root| project::create(&root, name, &classes));
                match created {
                    Ok(p) => println!("Created {} ({})", p.name, p.classes.join(", ")),
                    Err(e) => println!("error: {e}"),
                }
            }
            Some("help" | "?") => HOME_HELP.iter().for_each(|l| println!("{l}")),
            Some("quit" | "exit" | "q") => return Ok(()),
            Some(other) => println!("unknown command '{other}', try 'help'"),
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Back,
    Quit,
}

/// One parsed line on the sorting screen.
#[derive(Debug, PartialEq)]
enum SortLine {
    Events(Vec<InputEvent>),
    Info,
    Keys,
    Help,
    Back,
    Quit,
}

fn parse_point(x: Option<&str>, y: Option<&str>) -> Option<Point> {
    Some(Point::new(x?.parse().ok()?, y?.parse().ok()?))
}

fn parse_sort_line(line: &str) -> Result<SortLine, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(SortLine::Events(vec![InputEvent::Key(Key::Space)]));
    }
    let (word, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .unwrap_or((trimmed, ""));
    let mut args = rest.split_whitespace();
    let single = |event: InputEvent| -> Result<SortLine, String> { Ok(SortLine::Events(vec![event])) };

    match word {
        "info" | "i" => Ok(SortLine::Info),
        "keys" => Ok(SortLine::Keys),
        "help" | "?" => Ok(SortLine::Help),
        "back" => Ok(SortLine::Back),
        "quit" | "exit" | "q" => Ok(SortLine::Quit),
        "add" => single(InputEvent::AddImages),
        "rename" => single(InputEvent::RenameEdited(rest.to_string())),
        "send" if !rest.is_empty() => single(InputEvent::ClassAction(rest.to_string())),
        "press" | "move" | "release" => {
            let point = parse_point(args.next(), args.next())
                .ok_or_else(|| format!("usage: {word} x y"))?;
            single(match word {
                "press" => InputEvent::PointerDown(point),
                "move" => InputEvent::PointerMove(point),
                _ => InputEvent::PointerUp(point),
            })
        }
        "drag" => {
            let usage = || "usage: drag x1 y1 x2 y2".to_string();
            let from = parse_point(args.next(), args.next()).ok_or_else(usage)?;
            let to = parse_point(args.next(), args.next()).ok_or_else(usage)?;
            Ok(SortLine::Events(vec![
                InputEvent::PointerDown(from),
                InputEvent::PointerMove(to),
                InputEvent::PointerUp(to),
            ]))
        }
        "resize" => {
            let parsed = args
                .next()
                .zip(args.next())
                .and_then(|(w, h)| Some(Size::new(w.parse().ok()?, h.parse().ok()?)));
            parsed
                .map(|size| SortLine::Events(vec![InputEvent::Resize(size)]))
                .ok_or_else(|| "usage: resize w h".to_string())
        }
        _ if rest.is_empty() => match Key::parse(word) {
            Some(key) => single(InputEvent::Key(key)),
            None => Err(format!("unknown command '{word}', try 'help'")),
        },
        _ => Err(format!("unknown command '{word}', try 'help'")),
    }
}

fn show_current(controller: &Controller<RustBackend, PromptPicker>) {
    if let Some(item) = controller.current() {
        let mapping = controller.session().mapping(controller.viewport());
        output::print_sort_screen(item, mapping.as_ref());
    }
}

fn report(controller: &Controller<RustBackend, PromptPicker>, response: &Response, last: &mut Option<PathBuf>) {
    output::print_status(&response.status);
    let current = controller.current().map(|item| item.path.clone());
    if current != *last {
        if let Some(item) = controller.current() {
            output::print_lines(&output::format_image_info(item));
        }
        *last = current;
    }
    if response.redraw {
        show_current(controller);
    }
}

fn sort_project(
    opened: project::Project,
    app_config: &AppConfig,
) -> Result<Exit, Box<dyn std::error::Error>> {
    println!("Project: {}", opened.name);
    let mut controller = Controller::new(opened, RustBackend::new(), PromptPicker, app_config);
    output::print_lines(&output::format_key_legend(controller.keymap()));

    let mut last = None;
    match controller.start() {
        Ok(response) => report(&controller, &response, &mut last),
        Err(e) => println!("error: {e}"),
    }

    while let Some(line) = read_line("sort> ")? {
        let parsed = match parse_sort_line(&line) {
            Ok(parsed) => parsed,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };
        match parsed {
            SortLine::Events(events) => {
                for event in events {
                    match controller.handle(event) {
                        Ok(response) => report(&controller, &response, &mut last),
                        Err(e) => {
                            println!("error: {e}");
                            break;
                        }
                    }
                }
            }
            SortLine::Info => match controller.current() {
                Some(item) => output::print_lines(&output::format_image_info(item)),
                None => println!("{}", output::format_empty_pool()),
            },
            SortLine::Keys => output::print_lines(&output::format_key_legend(controller.keymap())),
            SortLine::Help => SORT_HELP.iter().for_each(|l| println!("{l}")),
            SortLine::Back => return Ok(Exit::Back),
            SortLine::Quit => return Ok(Exit::Quit),
        }
    }
    Ok(Exit::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(line: &str) -> Vec<InputEvent> {
        match parse_sort_line(line).unwrap() {
            SortLine::Events(events) => events,
            other => panic!("expected events for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn empty_line_is_space() {
        assert_eq!(events(""), [InputEvent::Key(Key::Space)]);
        assert_eq!(events("   "), [InputEvent::Key(Key::Space)]);
    }

    #[test]
    fn single_characters_are_keys() {
        assert_eq!(events("3"), [InputEvent::Key(Key::Digit(3))]);
        assert_eq!(events("n"), [InputEvent::Key(Key::Char('n'))]);
    }

    #[test]
    fn rename_keeps_inner_spaces_and_allows_blank() {
        assert_eq!(
            events("rename  summer trip "),
            [InputEvent::RenameEdited("summer trip".into())]
        );
        assert_eq!(events("rename"), [InputEvent::RenameEdited(String::new())]);
    }

    #[test]
    fn drag_expands_to_pointer_sequence() {
        assert_eq!(
            events("drag 10 20 30 40"),
            [
                InputEvent::PointerDown(Point::new(10, 20)),
                InputEvent::PointerMove(Point::new(30, 40)),
                InputEvent::PointerUp(Point::new(30, 40)),
            ]
        );
        assert!(parse_sort_line("drag 1 2 3").is_err());
    }

    #[test]
    fn pointer_and_resize() {
        assert_eq!(events("press -5 7"), [InputEvent::PointerDown(Point::new(-5, 7))]);
        assert_eq!(events("resize 800 600"), [InputEvent::Resize(Size::new(800, 600))]);
        assert!(parse_sort_line("resize 800").is_err());
    }

    #[test]
    fn send_and_screen_commands() {
        assert_eq!(events("send owls"), [InputEvent::ClassAction("owls".into())]);
        assert!(parse_sort_line("send").is_err());
        assert_eq!(parse_sort_line("back").unwrap(), SortLine::Back);
        assert_eq!(parse_sort_line("info").unwrap(), SortLine::Info);
        assert!(parse_sort_line("bogus").is_err());
    }
}
