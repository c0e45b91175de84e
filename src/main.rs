//! LTK Arcade CLI
//!
//! Drives the arcade core from the terminal against the simulated token
//! contract: claim the daily grant, buy plays, play, settle winnings.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ltk_arcade::{
    claim::ClaimState,
    config::{ArcadeConfig, ConfigLoader},
    games::{CoinSide, GameSession, GameType, LetterStatus, Play, RandomSource, StdRandom},
    ArcadeServices, PlayerId,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LTK Arcade
#[derive(Parser)]
#[command(name = "ltk-arcade")]
#[command(about = "Play-to-earn arcade core with a simulated LTK token contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for the key-value store
    #[arg(short, long)]
    data_dir: Option<String>,

    /// Wallet address of the player
    #[arg(short, long, env = "ARCADE_PLAYER")]
    player: Option<String>,

    /// Seed the outcome RNG for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show balance, pending rewards and claim availability
    Status,

    /// Claim the daily LTK grant
    Claim,

    /// Buy plays and play them
    Play {
        /// coinflip, dice or slots
        game: GameType,

        /// Coin side to call (coin flip only)
        #[arg(long, default_value = "heads")]
        choice: CoinSide,

        /// Number of plays to buy and play
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Print each outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play one word game, guesses read from stdin
    Word,

    /// Mint pending rewards to the wallet
    Settle,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new().with_path(path).load()?,
        None => ConfigLoader::new().load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_directory = dir.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ltk_arcade={}", config.monitoring.log_level.as_filter()).into()),
        )
        .init();

    let player = PlayerId::from(cli.player.as_deref());
    let mut rng = match cli.seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_os()?,
    };
    let services = ArcadeServices::from_config(config)?;

    match cli.command {
        Commands::Status => show_status(&services, &player).await?,
        Commands::Claim => {
            let receipt = services.claim_daily(&player).await?;
            println!("Claimed {} {} (tx {})", receipt.amount, symbol(services.config()), receipt.tx);
            println!("Next claim at {}", format_time(receipt.next_claim_at));
        }
        Commands::Play {
            game,
            choice,
            rounds,
            json,
        } => {
            let play = match game {
                GameType::CoinFlip => Play::CoinFlip { choice },
                GameType::Dice => Play::Dice,
                GameType::Slots => Play::Slots,
                GameType::Word => return Err("use the `word` command for the word game".into()),
            };
            let mut session = services.new_session(game);
            let quantity = rounds.unwrap_or_else(|| services.purchases().default_quantity());
            buy(&services, &player, &mut session, quantity).await?;
            play_rounds(&services, &player, &mut session, &play, &mut rng, json)?;
        }
        Commands::Word => {
            let mut session = services.new_session(GameType::Word);
            buy(&services, &player, &mut session, 1).await?;
            play_word(&services, &player, &mut session, &mut rng)?;
        }
        Commands::Settle => {
            let receipt = services.settle_pending_rewards(&player).await?;
            println!("Settled {} {} (tx {})", receipt.amount, symbol(services.config()), receipt.tx);
        }
    }

    Ok(())
}

fn symbol(config: &ArcadeConfig) -> &str {
    &config.settlement.token_symbol
}

fn format_time(unix_secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(unix_secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

async fn show_status(services: &ArcadeServices, player: &PlayerId) -> Result<(), Box<dyn std::error::Error>> {
    let sym = symbol(services.config());
    println!("Player:          {}", player);
    println!("Balance:         {} {}", services.balance_of(player).await?, sym);
    println!(
        "Pending rewards: {} {}",
        services.ledger().get_pending_rewards(player),
        sym
    );
    match services.claims().status(player) {
        ClaimState::Claimable => println!("Daily claim:     available"),
        ClaimState::Cooldown { remaining_secs } => {
            let next = services.claims().last_claim(player).unwrap_or(0) + services.config().claim.cooldown_seconds;
            println!(
                "Daily claim:     in {}h {}m ({})",
                remaining_secs / 3600,
                (remaining_secs % 3600) / 60,
                format_time(next)
            );
        }
    }
    Ok(())
}

async fn buy(
    services: &ArcadeServices,
    player: &PlayerId,
    session: &mut GameSession,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let receipt = services.purchase(player, session, quantity).await?;
    println!(
        "Bought {} play(s) of {} for {} {} (tx {})",
        receipt.quantity,
        session.game(),
        receipt.cost,
        symbol(services.config()),
        receipt.tx
    );
    Ok(())
}

fn play_rounds(
    services: &ArcadeServices,
    player: &PlayerId,
    session: &mut GameSession,
    play: &Play,
    rng: &mut dyn RandomSource,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut won_total = 0.0;
    while session.credits() > 0 {
        let outcome = services.play(player, session, play, rng)?;
        won_total += outcome.reward_amount;
        if json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else if outcome.won {
            println!("{:?} won {}", outcome.detail, outcome.reward_amount);
        } else {
            println!("{:?} lost", outcome.detail);
        }
    }

    println!(
        "Won {} {} this session, {} pending",
        won_total,
        symbol(services.config()),
        services.ledger().get_pending_rewards(player)
    );
    Ok(())
}

fn play_word(
    services: &ArcadeServices,
    player: &PlayerId,
    session: &mut GameSession,
    rng: &mut dyn RandomSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = services.start_word_game(session, rng)?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !board.is_over() {
        print!("Guess ({} left): ", board.remaining_attempts());
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };

        let result = match services.submit_word_guess(player, session, &mut board, &line?) {
            Ok(result) => result,
            Err(e) if e.is_precondition() => {
                println!("{}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let row: String = result
            .tiles
            .iter()
            .map(|tile| match tile.status {
                LetterStatus::Correct => format!("[{}]", tile.letter),
                LetterStatus::Present => format!("({})", tile.letter),
                LetterStatus::Absent => format!(" {} ", tile.letter),
            })
            .collect();
        println!("{}", row);

        if let Some(outcome) = result.outcome {
            if outcome.won {
                println!("Solved! {} {} added to pending rewards", outcome.reward_amount, symbol(services.config()));
            } else {
                println!("Out of attempts, the word was {}", board.revealed_target().unwrap_or("?"));
            }
        }
    }
    Ok(())
}
