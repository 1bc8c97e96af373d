use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tcb_solver::core::CardId;
use tcb_solver::deck::{self, DECKS};
use tcb_solver::game::{self, GameState};
use tcb_solver::solver::{self, snapshot, SearchLimits, Solver};
use tcb_solver::SolverError;

#[derive(Parser)]
#[command(name = "tcb", about = "Perfect-play solver for Three Card Blind", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a matchup and print its game value
    Solve {
        deck1: String,
        deck2: String,
        /// Who goes first (0 = deck1, 1 = deck2)
        #[arg(long, default_value_t = 0)]
        first: u8,
        /// Node budget; the result is a bound if it runs out
        #[arg(long)]
        budget: Option<u64>,
        /// Transposition snapshot to reuse and update
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Show the optimal play line of a matchup
    Show {
        deck1: String,
        deck2: String,
        #[arg(long, default_value_t = 0)]
        first: u8,
    },
    /// Play a deck against an empty opponent and report the kill turn
    Goldfish {
        deck: String,
        /// Horizon in the goldfisher's own turns
        #[arg(long, default_value_t = 20)]
        turns: u32,
    },
    /// Solve every deck pairing and print the payoff matrix
    Metagame,
    /// List the registered decks
    List,
}

fn value_label(value: i8, complete: bool) -> String {
    let base = match value {
        1 => "first mover wins",
        -1 => "first mover loses",
        _ => "draw",
    };
    if complete {
        base.to_string()
    } else {
        format!("{base} (partial bound, budget exhausted)")
    }
}

/// A deck argument is a registry name, or an ad-hoc comma-separated card
/// list like "Mountain,Raging Goblin".
fn resolve_deck(arg: &str) -> Result<(String, Vec<CardId>), SolverError> {
    if let Ok(entry) = deck::find(arg) {
        return Ok((entry.label.to_string(), entry.cards.to_vec()));
    }
    if arg.contains(',') {
        let cards = arg
            .split(',')
            .map(str::trim)
            .map(|name| {
                CardId::by_name(name).ok_or_else(|| SolverError::UnknownCard(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((arg.to_string(), cards));
    }
    Err(SolverError::UnknownDeck(arg.to_string()))
}

fn cmd_solve(
    deck1: &str,
    deck2: &str,
    first: u8,
    budget: Option<u64>,
    snapshot_path: Option<&PathBuf>,
) -> Result<(), SolverError> {
    let (label1, cards1) = resolve_deck(deck1)?;
    let (label2, cards2) = resolve_deck(deck2)?;
    println!("{label1} vs {label2}");
    println!("First mover: P{}", first + 1);

    let limits = SearchLimits {
        node_budget: budget,
        ..SearchLimits::default()
    };
    let mut solver = Solver::new(limits);
    if let Some(path) = snapshot_path {
        match snapshot::load(path, limits.tt_capacity) {
            Ok(tt) => solver.tt = tt,
            Err(SolverError::CatalogMismatch { .. }) => {
                eprintln!("warning: snapshot was built against a different catalog, discarding");
            }
            Err(SolverError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    let report = solver.solve(&cards1, &cards2, first)?;
    println!(
        "Value: {:+} ({})",
        report.value,
        value_label(report.value, report.complete)
    );
    println!("Nodes: {}", report.nodes);

    if let Some(path) = snapshot_path {
        snapshot::save(path, &solver.tt)?;
    }
    Ok(())
}

fn cmd_show(deck1: &str, deck2: &str, first: u8) -> Result<(), SolverError> {
    let (label1, cards1) = resolve_deck(deck1)?;
    let (label2, cards2) = resolve_deck(deck2)?;
    println!("{label1} vs {label2}");
    println!("First mover: P{}", first + 1);

    let report = Solver::new(SearchLimits::default()).solve(&cards1, &cards2, first)?;
    println!(
        "Value: {:+} ({})",
        report.value,
        value_label(report.value, report.complete)
    );
    println!();
    println!("{:<6} {:<8} {:<44} {:>7} {:>7}", "Turn", "Player", "Action", "P1", "P2");

    let state = GameState::new(&cards1, &cards2, first)?;
    let mut state = game::advance(state)?;
    for (_, action) in &report.principal_variation {
        let mover = game::priority_player(&state);
        let description = game::describe_action(&state, action);
        state = game::apply(&state, action)?;
        println!(
            "{:<6} {:<8} {:<44} {:>7} {:>7}",
            state.turn,
            format!("P{}", mover + 1),
            description,
            state.players[0].life,
            state.players[1].life
        );
    }
    match state.outcome {
        Some(game::Outcome::Winner(p)) => println!("\n>>> P{} WINS", p + 1),
        Some(game::Outcome::Draw) => println!("\n>>> DRAW"),
        None => println!("\n>>> DRAW (no progress)"),
    }
    Ok(())
}

fn cmd_goldfish(deck: &str, turns: u32) -> Result<(), SolverError> {
    let (label, cards) = resolve_deck(deck)?;
    println!("{label} vs Goldfish");

    let report = solver::goldfish(&cards, turns)?;
    match report.kill_turn {
        Some(turn) => {
            println!("{:<6} {:<44}", "Turn", "Action");
            let state = GameState::new(&cards, &[], 0)?;
            let mut state = game::advance(state)?;
            for (_, action) in &report.line {
                // Skip the inert opponent's forced passes when replaying.
                while game::priority_player(&state) == 1 {
                    state = game::apply(&state, &game::Action::Pass)?;
                }
                let description = game::describe_action(&state, action);
                state = game::apply(&state, action)?;
                if !matches!(action, game::Action::Pass) {
                    println!("{:<6} {:<44}", (state.turn + 1) / 2, description);
                }
            }
            println!("\nGoldfish defeated on turn {turn}");
        }
        None => println!("No kill within {turns} turns"),
    }
    Ok(())
}

fn cmd_metagame() -> Result<(), SolverError> {
    let decks: Vec<&[_]> = DECKS.iter().map(|d| d.cards).collect();
    let matrix = solver::payoff_matrix(&decks, SearchLimits::default())?;

    println!("Payoff matrix (play + draw, from row deck's perspective):");
    print!("{:<12}", "");
    for d in DECKS {
        print!("{:>10}", d.name);
    }
    println!();
    for (i, d) in DECKS.iter().enumerate() {
        print!("{:<12}", d.name);
        for value in &matrix[i] {
            print!("{value:>+10}");
        }
        println!();
    }
    Ok(())
}

fn cmd_list() {
    println!("Available decks:");
    for deck in DECKS {
        println!("  {:<12} {}", deck.name, deck.label);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Command::Solve { first, .. } | Command::Show { first, .. } = &cli.command {
        if *first > 1 {
            eprintln!("error: --first must be 0 or 1");
            return ExitCode::from(1);
        }
    }
    let result = match &cli.command {
        Command::Solve {
            deck1,
            deck2,
            first,
            budget,
            snapshot,
        } => cmd_solve(deck1, deck2, *first, *budget, snapshot.as_ref()),
        Command::Show { deck1, deck2, first } => cmd_show(deck1, deck2, *first),
        Command::Goldfish { deck, turns } => cmd_goldfish(deck, *turns),
        Command::Metagame => cmd_metagame(),
        Command::List => {
            cmd_list();
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ (SolverError::IllegalAction { .. } | SolverError::InvariantViolation(_))) => {
            eprintln!("internal error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}
