use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use sso_core::{ShipClass, UpgradeKind};
use sso_game::{
    FileStore, GameSession, LogEntry, LogKind, NotificationKind, SystemClock, TableNarrator,
    TravelPhase,
};

const HELP: &str = "\
  go X Y            set a course for sector (X, Y)
  scan              launch a probe into the current sector
  upgrade [SYSTEM]  list upgrades, or buy one (hull, engine, scanner, extraction)
  choose N          answer the current event by number or text
  wait [SECS]       let game time pass (default: until arrival or an event)
  select X Y        inspect a sector
  status            ship stats
  map               sector map
  log               the captain's log
  achievements      achievement progress
  ship [CLASS]      list ship classes, or change yours
  save              save now
  quit              save and leave";

/// One line of player input.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Go(i32, i32),
    Scan,
    Upgrade(Option<UpgradeKind>),
    Choose(String),
    Wait(Option<f64>),
    Select(i32, i32),
    Status,
    Map,
    Log,
    Achievements,
    Ship(Option<ShipClass>),
    Save,
    Help,
    Quit,
}

fn parse_coords(args: &[&str], usage: &str) -> Result<(i32, i32), String> {
    let [x, y] = args else {
        return Err(format!("usage: {usage}"));
    };
    let x = x
        .parse()
        .map_err(|_| format!("'{x}' is not a coordinate"))?;
    let y = y
        .parse()
        .map_err(|_| format!("'{y}' is not a coordinate"))?;
    Ok((x, y))
}

fn parse(input: &str) -> Result<Command, String> {
    let mut words = input.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    match head.to_lowercase().as_str() {
        "go" | "goto" => parse_coords(&args, "go X Y").map(|(x, y)| Command::Go(x, y)),
        "select" | "sel" => parse_coords(&args, "select X Y").map(|(x, y)| Command::Select(x, y)),
        "scan" => Ok(Command::Scan),
        "upgrade" | "up" => {
            if args.is_empty() {
                return Ok(Command::Upgrade(None));
            }
            UpgradeKind::parse(&args.join(" "))
                .map(|kind| Command::Upgrade(Some(kind)))
                .map_err(|e| e.to_string())
        }
        "choose" | "c" => {
            if args.is_empty() {
                return Err("usage: choose N".to_string());
            }
            Ok(Command::Choose(args.join(" ")))
        }
        "wait" | "w" => match args.first() {
            None => Ok(Command::Wait(None)),
            Some(secs) => secs
                .parse::<f64>()
                .ok()
                .filter(|s| *s > 0.0)
                .map(|s| Command::Wait(Some(s)))
                .ok_or_else(|| format!("'{secs}' is not a positive number of seconds")),
        },
        "status" | "s" => Ok(Command::Status),
        "map" | "m" => Ok(Command::Map),
        "log" | "l" => Ok(Command::Log),
        "achievements" | "a" => Ok(Command::Achievements),
        "ship" => {
            if args.is_empty() {
                return Ok(Command::Ship(None));
            }
            ShipClass::parse(&args.join(" "))
                .map(|class| Command::Ship(Some(class)))
                .map_err(|e| e.to_string())
        }
        "save" => Ok(Command::Save),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}

fn styled(entry: &LogEntry) -> String {
    let text = entry.text.as_str();
    match entry.kind {
        LogKind::System => text.dimmed().to_string(),
        LogKind::Travel => text.cyan().to_string(),
        LogKind::Discovery => text.green().to_string(),
        LogKind::Narrative => text.italic().to_string(),
        LogKind::Event => text.yellow().to_string(),
        LogKind::Scan => text.blue().to_string(),
        LogKind::Upgrade => text.magenta().to_string(),
        LogKind::Achievement => text.bright_yellow().bold().to_string(),
        LogKind::Warning => text.red().to_string(),
    }
}

struct Play {
    session: GameSession,
    narrator: TableNarrator,
    speed: f64,
    last_log: u64,
    last_notice: u64,
    event_shown: bool,
    typewriter: bool,
}

impl Play {
    /// Fire due timers, answer collaborator requests and print what changed.
    fn tick(&mut self) {
        self.session.update();
        self.session.pump(&mut self.narrator);
        self.flush();
    }

    fn flush(&mut self) {
        let entries = self.session.journal().since(self.last_log).to_vec();
        for entry in &entries {
            if entry.typing && self.typewriter {
                type_out(&format!("  {}", entry.text));
            } else {
                println!("  {}", styled(entry));
            }
            self.last_log = entry.id;
        }

        let notices: Vec<_> = self
            .session
            .notifications()
            .active()
            .iter()
            .filter(|n| n.id > self.last_notice)
            .cloned()
            .collect();
        for notice in notices {
            let badge = match notice.kind {
                NotificationKind::Info => "[info]".normal(),
                NotificationKind::Success => "[ok]".green(),
                NotificationKind::Warning => "[warn]".yellow(),
                NotificationKind::Error => "[error]".red().bold(),
                NotificationKind::Achievement => "[achievement]".bright_yellow(),
                NotificationKind::LevelUp => "[level up]".bright_magenta().bold(),
            };
            println!("  {badge} {}", notice.message);
            self.last_notice = notice.id;
        }

        match self.session.active_event() {
            Some(event) if !self.event_shown => {
                println!("  {}", "Choose:".bold());
                for (i, choice) in event.choices.iter().enumerate() {
                    println!("    {}. {choice}", i + 1);
                }
                self.event_shown = true;
            }
            Some(_) => {}
            None => self.event_shown = false,
        }
    }

    fn execute(&mut self, command: Command) -> Result<Option<String>, String> {
        let applied = match command {
            Command::Go(x, y) => self.session.set_course(x, y).map(|_| None),
            Command::Scan => self.session.scan().map(|_| None),
            Command::Upgrade(None) => {
                return Ok(Some(super::upgrade_table(self.session.ship()).to_string()));
            }
            Command::Upgrade(Some(kind)) => self.session.upgrade(kind).map(|_| None),
            Command::Choose(input) => self.session.choose(&input).map(|_| None),
            Command::Select(x, y) => {
                self.session.select_sector(x, y).map_err(|e| e.to_string())?;
                return Ok(Some(self.describe_selected()));
            }
            Command::Wait(secs) => return self.wait(secs),
            Command::Status => return Ok(Some(self.status())),
            Command::Map => {
                let ship = self.session.ship();
                return Ok(Some(format!(
                    "{}\n{}",
                    super::map_table(self.session.grid(), ship),
                    super::map_legend()
                )));
            }
            Command::Log => return Ok(Some(self.session.journal().export_text())),
            Command::Achievements => {
                return Ok(Some(super::achievement_lines(self.session.achievements())));
            }
            Command::Ship(None) => {
                let classes: Vec<String> = ShipClass::ALL.iter().map(ToString::to_string).collect();
                return Ok(Some(format!(
                    "  Current: {}\n  Available: {}",
                    self.session.ship().class,
                    classes.join(", ")
                )));
            }
            Command::Ship(Some(class)) => {
                self.session.set_ship_class(class);
                Ok(None)
            }
            Command::Save => {
                self.session.save().map_err(|e| e.to_string())?;
                return Ok(Some("  Game saved.".to_string()));
            }
            Command::Help => return Ok(Some(HELP.to_string())),
            Command::Quit => Ok(None),
        };
        applied.map_err(|e| e.to_string())
    }

    fn status(&self) -> String {
        let ship = self.session.ship();
        let mut out = format!(
            "{}\n{}",
            super::status_table(ship, self.session.grid(), self.session.achievements()),
            super::upgrade_table(ship)
        );
        if let (Some(travel), Some(progress)) =
            (self.session.travel(), self.session.travel_progress())
        {
            let (x, y) = self.session.interpolated_position();
            out.push_str(&format!(
                "\n  En route to {}: {:.0}% (near {x:.1}, {y:.1})",
                travel.destination,
                progress * 100.0
            ));
        }
        out
    }

    fn describe_selected(&self) -> String {
        let coord = self.session.selected_sector();
        match self.session.grid().get(coord) {
            Ok(sector) if sector.explored => {
                format!("  {coord}: {} ({:?})", sector.kind, sector.owner)
            }
            Ok(_) => format!("  {coord}: uncharted"),
            Err(e) => format!("  {e}"),
        }
    }

    /// Let game time pass. Stops early when an event needs an answer.
    fn wait(&mut self, secs: Option<f64>) -> Result<Option<String>, String> {
        let start = self.session.now();
        let target = secs.map(|s| start.saturating_add((s * 1000.0) as u64));
        if target.is_none() && !matches!(self.session.phase(), TravelPhase::Traveling { .. }) {
            return Err("nothing to wait for; set a course first".to_string());
        }

        loop {
            self.tick();
            if self.session.active_event().is_some() {
                return Ok(None);
            }
            let now = self.session.now();
            let done = match target {
                Some(target) => now >= target,
                None => !matches!(self.session.phase(), TravelPhase::Traveling { .. }),
            };
            if done {
                return Ok(None);
            }
            let next = self
                .session
                .next_deadline()
                .unwrap_or(u64::MAX)
                .min(target.unwrap_or(u64::MAX));
            let game_ms = next.saturating_sub(now).max(1);
            let real_secs = (game_ms as f64 / 1000.0 / self.speed).min(1.0);
            std::thread::sleep(Duration::from_secs_f64(real_secs));
        }
    }
}

fn type_out(text: &str) {
    let mut stdout = io::stdout();
    for ch in text.chars() {
        print!("{ch}");
        if stdout.flush().is_err() {
            break;
        }
        std::thread::sleep(Duration::from_millis(12));
    }
    println!();
}

pub fn run(dir: &Path, seed: Option<u64>, speed: f64, config: Option<&Path>) -> Result<(), String> {
    let config = super::load_config(config, seed)?;
    let narrator = TableNarrator::new(config.seed);
    let clock = SystemClock::with_speed(speed);
    let speed = clock.speed();
    let session = GameSession::load_or_new(config, Box::new(clock), Box::new(FileStore::new(dir)))
        .map_err(|e| format!("failed to start session: {e}"))?;
    log::info!("session started from {} at {speed}x", dir.display());

    let mut play = Play {
        session,
        narrator,
        speed,
        last_log: 0,
        last_notice: 0,
        event_shown: false,
        typewriter: io::stdout().is_terminal(),
    };

    println!("  {} Soul Ship Odyssey", "Launching".bold());
    println!("  Seed: {} | Speed: {speed}x", play.session.config().seed);
    println!("  Type 'help' for commands, 'quit' to exit.\n");
    play.tick();

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            play.tick();
            continue;
        }

        let command = match parse(input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}\n", e.yellow());
                continue;
            }
        };
        log::debug!("command {command:?}");
        play.tick();
        if command == Command::Quit {
            break;
        }

        match play.execute(command) {
            Ok(Some(output)) => println!("{output}\n"),
            Ok(None) => {}
            Err(e) => println!("  {}\n", e.yellow()),
        }
        play.tick();
    }

    match play.session.save() {
        Ok(()) => println!("  Voyage saved. Fair winds."),
        Err(e) => eprintln!("  {} {e}", "warning:".yellow()),
    }
    Ok(())
}
