use anyhow::Context;
use clap::Parser;
use food_facts_etl::core::ConfigProvider;
use food_facts_etl::utils::error::NutritionError;
use food_facts_etl::utils::{logger, validation::Validate};
use food_facts_etl::{CliConfig, EtlEngine, EtlOutcome, LocalStorage, ProductPipeline, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting food-facts-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        return Err(fail(&e));
    }

    let exit_code = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            if let Err(e) = config.validate() {
                return Err(fail(&e));
            }
            run(config, &cli).await?
        }
        None => run(cli.clone(), &cli).await?,
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn run<C: ConfigProvider>(config: C, cli: &CliConfig) -> anyhow::Result<i32> {
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ProductPipeline::new(storage, config).map_err(|e| fail(&e))?;
    let engine = EtlEngine::new(pipeline);

    let result = match &cli.input {
        Some(input) => {
            let path = std::path::absolute(input)
                .with_context(|| format!("invalid input path '{}'", input))?;
            let path = path.to_string_lossy();
            match engine.pipeline().extract_from_storage(&path).await {
                Ok(record) => engine.run_records(&[record]).await,
                Err(e) => Err(e),
            }
        }
        None => engine.run(&cli.barcodes).await,
    };

    match result {
        Ok(outcome) => {
            print_summary(&outcome);
            // Every lookup failed: nothing useful was produced.
            if outcome.report.reports.is_empty() && !outcome.report.failures.is_empty() {
                return Ok(2);
            }
            Ok(0)
        }
        Err(e) => {
            tracing::error!(
                "❌ Lookup failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            Ok(e.exit_code())
        }
    }
}

fn fail(e: &NutritionError) -> anyhow::Error {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    anyhow::anyhow!("{}", e.user_friendly_message())
}

fn print_summary(outcome: &EtlOutcome) {
    for product in &outcome.report.reports {
        println!(
            "📦 {} {}",
            product.barcode,
            product.product_name.as_deref().unwrap_or("(unnamed product)")
        );

        if product.levels.is_empty() {
            println!("  Nutrient levels: not available");
        }
        for entry in &product.levels {
            println!("  {:<14} {:<9} {}", entry.nutrient.display_name(), entry.level, entry.value);
        }

        if product.facts.is_empty() {
            println!("  Nutrition facts: not available");
        } else {
            println!("  Nutrition facts:");
        }
        for row in &product.facts {
            println!("    {:<14} {}", row.nutrient, row.value.replace('\n', " "));
        }

        for trace in [&product.level_trace, &product.facts_trace].into_iter().flatten() {
            println!("  🔍 {} ({} result(s))", trace.method_used, trace.result_count);
            for step in &trace.steps {
                println!("     - {}", step);
            }
        }
    }

    for failure in &outcome.report.failures {
        println!("❌ {}: {}", failure.barcode, failure.message);
    }
    println!("📁 Output saved to: {}", outcome.output_path);
}
