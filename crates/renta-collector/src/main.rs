//! BVC 시세/환율 수집기 CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use renta_collector::{modules, CollectorConfig, Orchestrator, RunReport, TaskSelector};
use renta_core::{init_logging, LogConfig, LogFormat};
use renta_data::{reference_equities, Database, DatabaseConfig, PgMarketStore};

#[derive(Parser)]
#[command(name = "renta-collector")]
#[command(about = "BVC price and exchange rate collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 없으면 `RUST_LOG`
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact). 없으면 `LOG_FORMAT`
    #[arg(long)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 환율(매일)과 시세(평일)를 스케줄에 따라 갱신
    Daemon,

    /// 작업 1회 실행
    Run {
        /// 실행할 작업 ("tasas" = 환율, 그 외 = BVC 시세)
        #[arg(long, default_value = "bvc")]
        task: String,
    },

    /// 기준 종목 등록
    SeedEquities,

    /// 활성 종목 최신 시세 기준 시장 요약
    Summary {
        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 외부 소스 점검 (저장하지 않음)
    CheckSources {
        /// 점검할 종목 (쉼표로 구분, 예: "BNC,BPV")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 스케줄 설정과 마지막 갱신 시각 출력
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = &cli.log_level {
        log_config.level = format!("renta_collector={0},renta_data={0}", level);
    }
    if let Some(format) = &cli.log_format {
        log_config = log_config.with_format(format.parse::<LogFormat>()?);
    }
    init_logging(log_config)?;

    tracing::info!("Renta Collector 시작");

    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        update_time = %config.schedule.update_time,
        timezone = %config.schedule.timezone,
        symbols = config.sources.symbols.len(),
        "설정 로드 완료"
    );

    match &cli.command {
        Commands::CheckSources { symbols } => {
            let symbols = symbols.as_deref().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            });
            let probe = modules::check_sources(&config, symbols).await?;
            print_probe(&probe);
            probe.stats.log_summary("소스 점검");
            return Ok(());
        }
        Commands::ShowConfig if config.database_url.is_none() => {
            print_config(&config, None);
            return Ok(());
        }
        _ => {}
    }

    let mut db_config = DatabaseConfig::new(config.require_database_url()?);
    db_config.max_connections = config.db_max_connections;
    let db = Database::connect(&db_config).await?;
    db.migrate().await?;
    let store = Arc::new(PgMarketStore::new(&db));

    match cli.command {
        Commands::Daemon => {
            let orchestrator = Orchestrator::from_config(&config, store)?;
            let schedule = orchestrator.schedule();
            tracing::info!(
                rates = ?schedule.rates,
                prices = ?schedule.prices,
                timezone = %schedule.timezone,
                "=== 데몬 모드 시작 ==="
            );

            orchestrator
                .run_daemon(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "종료 신호 대기 실패");
                    }
                })
                .await;
        }
        Commands::Run { task } => {
            let orchestrator = Orchestrator::from_config(&config, store)?;
            match orchestrator.trigger(TaskSelector::parse(&task)).await? {
                RunReport::Rates(pair) => {
                    println!(
                        "{}: 공식 {:.4} / 병행 {:.4}",
                        pair.date, pair.official_rate, pair.parallel_rate
                    );
                }
                RunReport::Prices(report) => {
                    println!(
                        "거래일 {}: 수집 {}, 저장 {}, 실패 {}",
                        report
                            .date
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        report.harvested,
                        report.persisted,
                        report.errors
                    );
                    if report.partial {
                        println!("조회 실패 종목: {}", report.failed_symbols.join(", "));
                    }
                }
            }
        }
        Commands::SeedEquities => {
            let stats = modules::seed_equities(store.as_ref(), &reference_equities()).await?;
            stats.log_summary("종목 등록");
        }
        Commands::Summary { json } => {
            let summary = modules::market_summary(store.as_ref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for equity in &summary.equities {
                    println!(
                        "{:<8} {} 종가 {:>12} 시총(공식) {:>16}",
                        equity.code,
                        equity.date,
                        fmt_opt(equity.close_price_local),
                        fmt_opt(equity.market_cap_official)
                    );
                }
                println!(
                    "합계 {}종목: 공식 {:.2} USD / 병행 {:.2} USD",
                    summary.equity_count, summary.total_cap_official, summary.total_cap_parallel
                );
            }
        }
        Commands::ShowConfig => {
            let marker = modules::last_update_marker(store.as_ref()).await?;
            print_config(&config, marker);
        }
        Commands::CheckSources { .. } => {}
    }

    db.pool().close().await;
    tracing::info!("Renta Collector 종료");

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_config(config: &CollectorConfig, marker: Option<String>) {
    let schedule = renta_collector::Schedule::from_config(&config.schedule);
    println!("갱신 시각: {}", config.schedule.update_time.format("%H:%M"));
    println!("환율 갱신: {}", schedule.rates.time().format("%H:%M"));
    println!("시간대: {}", config.schedule.timezone);
    println!("종목 수: {}", config.sources.symbols.len());
    println!("마지막 갱신: {}", marker.as_deref().unwrap_or("-"));
}

fn print_probe(probe: &modules::SourceProbe) {
    match &probe.official {
        Ok(rate) => println!("BCV: {} {:.4}", rate.date, rate.rate),
        Err(e) => println!("BCV: 실패 ({})", e),
    }
    match &probe.offers {
        Ok(offers) => {
            println!("P2P: 호가 {}건, 가중 평균 {}", offers.len(), fmt_opt(probe.parallel_rate));
            for offer in offers {
                println!(
                    "  {:>10} {:>12} {}",
                    fmt_opt(offer.price),
                    fmt_opt(offer.volume),
                    offer.merchant.as_deref().unwrap_or("-")
                );
            }
        }
        Err(e) => println!("P2P: 실패 ({})", e),
    }
    for symbol in &probe.symbols {
        match &symbol.result {
            Ok((rows, latest)) => println!(
                "BVC {}: {}행, 최신 {}",
                symbol.symbol,
                rows,
                latest.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
            ),
            Err(e) => println!("BVC {}: 실패 ({})", symbol.symbol, e),
        }
    }
}
