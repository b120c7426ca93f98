use anyhow::{anyhow, Context};
use chrono::{Utc, Weekday};
use clap::{Parser, Subcommand, ValueEnum};
use dca_scout::config::{parse_date_millis, Config};
use dca_scout::report;
use dca_scout::services::scorer::{SUNDAY_WEEKDAY_BONUS, THURSDAY_WEEKDAY_BONUS};
use dca_scout::services::{
    analyze_entry_points, analyze_timing_patterns, compare_weekdays, compare_with_best_weekday,
    compare_with_regular, load_history, simulate_strategies, DcaBacktester, QuantAnalyst,
    WeightProfile,
};
use dca_scout::sources::{fetch_history, BinanceClient};
use dca_scout::types::{parse_weekday, weekday_name, PriceSeries, Timeframe};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Trading pair (overrides DCA_SYMBOL)
    #[arg(long, global = true)]
    symbol: Option<String>,

    /// Base amount per purchase (overrides DCA_BASE_INVESTMENT)
    #[arg(long, global = true)]
    base: Option<f64>,

    /// Print JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the pair on 1d/4h/1w candles and size today's purchase
    Analyze,

    /// Rank weekdays by recent next-day returns
    BestDay,

    /// Backtest scored DCA on one weekday
    Backtest {
        /// Weekday to buy on (e.g. "thursday", "Sun")
        #[arg(long)]
        weekday: String,

        /// Scoring profile
        #[arg(long, value_enum, default_value = "fixed")]
        profile: ProfileArg,

        /// Flat weekday bonus of the fixed profile
        #[arg(long)]
        weekday_bonus: Option<f64>,

        /// First day of history, YYYY-MM-DD (overrides DCA_START_DATE)
        #[arg(long)]
        start: Option<String>,
    },

    /// Regular DCA on each of the seven weekdays
    CompareWeekdays {
        #[arg(long)]
        start: Option<String>,
    },

    /// Regular and indicator-conditional DCA on weekly candles
    Strategies {
        #[arg(long)]
        start: Option<String>,
    },

    /// Calendar and indicator-range patterns of weekly forward returns
    Patterns {
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Fixed weights plus a flat weekday bonus
    Fixed,
    /// All indicators plus the weekday pattern
    Multi,
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", report::to_json(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn history_start(config: &Config, start: Option<String>) -> anyhow::Result<i64> {
    match start {
        Some(date) => Ok(parse_date_millis(&date)?),
        None => Ok(config.start_timestamp()?),
    }
}

fn fixed_profile(weekday: Weekday, bonus: Option<f64>) -> WeightProfile {
    let default_bonus = if weekday == Weekday::Sun {
        SUNDAY_WEEKDAY_BONUS
    } else {
        THURSDAY_WEEKDAY_BONUS
    };
    WeightProfile::FixedWeekday {
        weekday_bonus: bonus.unwrap_or(default_bonus),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dca_scout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration, flags win over the environment
    let mut config = Config::from_env();
    if let Some(symbol) = cli.symbol {
        config.symbol = symbol.trim().to_uppercase();
    }
    if let Some(base) = cli.base {
        config.base_investment = base;
    }
    config.validate().context("invalid configuration")?;

    let client = BinanceClient::from_config(&config);
    let now = Utc::now();
    let end = now.timestamp_millis();
    info!("{} with base investment {:.2}", config.symbol, config.base_investment);

    match cli.command {
        Commands::Analyze => {
            let analyst = QuantAnalyst::new(
                client,
                &config.symbol,
                config.base_investment,
                config.analysis.clone(),
            );
            let analysis = analyst.analyze_multiple_timeframes(now).await?;
            emit(cli.json, &analysis, || report::render_market_analysis(&analysis))?;
        }
        Commands::BestDay => {
            let analyst = QuantAnalyst::new(
                client,
                &config.symbol,
                config.base_investment,
                config.analysis.clone(),
            );
            let timing = analyst.timing_info(now).await;
            emit(cli.json, &timing, || report::render_timing(analyst.symbol(), &timing))?;
        }
        Commands::Backtest {
            weekday,
            profile,
            weekday_bonus,
            start,
        } => {
            let day = parse_weekday(&weekday).ok_or_else(|| anyhow!("unknown weekday {:?}", weekday))?;
            let profile = match profile {
                ProfileArg::Fixed => fixed_profile(day, weekday_bonus),
                ProfileArg::Multi => WeightProfile::MultiIndicator,
            };
            let start = history_start(&config, start)?;
            let history = load_history(&client, &config.symbol, start, end).await?;

            let backtester =
                DcaBacktester::new(config.base_investment, profile).with_settings(&config.analysis);
            let result = if config.analysis.refetch_context {
                info!("Refetching context for every {} purchase", weekday_name(day));
                backtester
                    .run_weekday_refetching(&client, &config.symbol, &history, day)
                    .await?
            } else {
                backtester.run_weekday(&history, day)?
            };
            let comparison = compare_with_regular(&result, &history);
            let weekdays = compare_weekdays(&history, config.base_investment);
            let best_weekday = compare_with_best_weekday(&result, &weekdays);

            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct BacktestReport<'a> {
                result: &'a dca_scout::types::BacktestResult,
                comparison: &'a dca_scout::types::StrategyComparison,
                best_weekday: Option<&'a dca_scout::types::BestWeekdayComparison>,
            }
            let output = BacktestReport {
                result: &result,
                comparison: &comparison,
                best_weekday: best_weekday.as_ref(),
            };
            emit(cli.json, &output, || {
                let mut text = report::render_backtest(&result, &comparison);
                if let Some(best) = &best_weekday {
                    text.push('\n');
                    text.push_str(&report::render_best_weekday(best));
                }
                text
            })?;
        }
        Commands::CompareWeekdays { start } => {
            let start = history_start(&config, start)?;
            let history = load_history(&client, &config.symbol, start, end).await?;
            let results = compare_weekdays(&history, config.base_investment);
            emit(cli.json, &results[..], || report::render_weekday_comparison(&results))?;
        }
        Commands::Strategies { start } => {
            let start = history_start(&config, start)?;
            let history: PriceSeries =
                fetch_history(&client, &config.symbol, Timeframe::Weekly, start, end).await?;
            let results = simulate_strategies(&history, config.base_investment);
            emit(cli.json, &results[..], || report::render_strategies(&results))?;
        }
        Commands::Patterns { start } => {
            let start = history_start(&config, start)?;
            let history: PriceSeries =
                fetch_history(&client, &config.symbol, Timeframe::Weekly, start, end).await?;
            let timing = analyze_timing_patterns(&history);
            let entries = analyze_entry_points(&history);

            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct PatternReport<'a> {
                timing_patterns: &'a dca_scout::types::TimingPatterns,
                entry_points: &'a dca_scout::types::EntryPointAnalysis,
            }
            let output = PatternReport {
                timing_patterns: &timing,
                entry_points: &entries,
            };
            emit(cli.json, &output, || report::render_patterns(&timing, &entries))?;
        }
    }

    Ok(())
}
