use chrono::Local;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use reqwest::Client;
use sales_tax_sync::client::{create_http_client, BillingApi, GoogleSheetsClient, HighLevelClient};
use sales_tax_sync::service::{
    reformat_sheet, run_daily, ChartExporter, InvoiceFetcher, Pagination, ReportService, RunStateStore,
    SheetSynchronizer,
};
use sales_tax_sync::{logging, AppConfig, AppError};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sales-tax-sync")]
#[command(about = "Sync paid invoices into Google Sheets and build monthly sales tax totals", long_about = None)]
struct Args {
    /// Keep running and generate the report every day
    #[arg(long)]
    schedule: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the sales tax report once (default)
    Run,
    /// Rebuild the derived sheet with a Sales Tax column
    Reformat,
    /// Print a single invoice as JSON
    Invoice { id: String },
}

impl Args {
    /// --schedule 只能配合 run (或不带子命令) 使用
    fn validate(&self) -> Result<(), clap::Error> {
        match &self.command {
            Some(Command::Reformat) | Some(Command::Invoice { .. }) if self.schedule => Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--schedule can only be used with the `run` command",
            )),
            _ => Ok(()),
        }
    }
}

/// 组装报表服务 (每次运行重新读取访问令牌)
fn build_report_service(config: &AppConfig, http: &Client) -> Result<ReportService, AppError> {
    let billing = Arc::new(HighLevelClient::new(http.clone(), &config.billing));
    let fetcher = InvoiceFetcher::new(
        billing,
        Pagination::from_config(config.billing.page_size, config.billing.max_pages),
    );

    let sheets = Arc::new(GoogleSheetsClient::from_config(http.clone(), &config.sheets)?);
    let sync = SheetSynchronizer::new(
        sheets,
        config.sheets.worksheet_name.clone(),
        config.sheets.invoice_range.clone(),
    );

    Ok(ReportService::new(
        fetcher,
        sync,
        ChartExporter::new(&config.report.chart_file, config.report.chart_top_months),
        RunStateStore::new(&config.report.last_run_file),
        config.billing.lookback_days,
    )
    .with_embeds(&config.sheets.spreadsheet_id, &config.report.chart_page_url))
}

/// 运行一次报表; 错误只记录, 不向上传播
async fn run_report(config: &AppConfig, http: &Client) {
    let result = match build_report_service(config, http) {
        Ok(service) => service.generate_report(Local::now()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => info!(
            "Report generated successfully at {} ({} invoices, {} cells written)",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            summary.invoice_count,
            summary.cells_written
        ),
        Err(e) => error!("Error running report: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    if let Err(e) = args.validate() {
        e.exit();
    }

    // 加载配置
    let config = AppConfig::load()?;
    logging::init(Some(config.report.log_file.as_path()))?;
    info!("Starting with config: {:?}", config);

    let http = create_http_client()?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run if args.schedule => {
            info!("Starting scheduled report generation...");
            run_daily(&config.schedule, || run_report(&config, &http)).await?;
        }
        Command::Run => run_report(&config, &http).await,
        Command::Reformat => {
            let service = build_report_service(&config, &http)?;
            reformat_sheet(
                service.fetcher(),
                service.sync(),
                &config.sheets.derived_sheet,
                service.lookback_days(),
                Local::now().date_naive(),
            )
            .await?;
        }
        Command::Invoice { id } => {
            let billing = HighLevelClient::new(http.clone(), &config.billing);
            let invoice = billing.get_invoice(&id).await?;
            println!("{}", serde_json::to_string_pretty(&invoice)?);
        }
    }

    Ok(())
}
