use can_atkwin::{
    analysis::{Analysis, AnalysisSummary},
    config::AnalysisConfig,
    registry::CandidateRegistry,
    report::write_report,
    scheduler::ObfuscationOutcome,
    trace::load_trace,
    types::SlotState,
};
use chrono::Utc;
use colored::*;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <config.json> <trace.csv> [report.csv]",
            args.first().map(String::as_str).unwrap_or("analyze")
        );
        process::exit(2);
    }
    let config_path = &args[1];
    let trace_path = &args[2];
    let report_path = args.get(3).map(String::as_str).unwrap_or("final_candidates.csv");

    if let Err(e) = run(config_path, trace_path, report_path) {
        eprintln!("{} {}", "✗".red().bold(), e);
        process::exit(1);
    }
}

fn run(config_path: &str, trace_path: &str, report_path: &str) -> can_atkwin::Result<()> {
    println!(
        "{}",
        "═══════════════════════════════════════════════════════════════"
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "       CAN ATTACK-WINDOW ANALYSIS & SCHEDULE OBFUSCATION       "
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "═══════════════════════════════════════════════════════════════"
            .cyan()
            .bold()
    );
    println!("{} Started at {}", "→".bright_blue(), Utc::now().to_rfc3339());
    println!();

    println!("{} Loading configuration from {}...", "→".yellow(), config_path);
    let config = AnalysisConfig::from_file(config_path)?;
    let mut registry = CandidateRegistry::new(&config)?;
    println!(
        "{} {} candidates, hyperperiod {} s, {} passes",
        "✓".green(),
        registry.len(),
        config.hyperperiod,
        config.passes
    );

    println!("{} Loading trace from {}...", "→".yellow(), trace_path);
    let trace = load_trace(trace_path)?;
    println!("{} {} trace records", "✓".green(), trace.len());
    println!();

    println!("{} Analyzing the CAN traffic...", "→".green());
    let analysis = Analysis::new(&config);
    let mut summary = AnalysisSummary::default();

    for n in 0..config.passes {
        let pass = analysis.run_pass(&trace, &mut registry, n)?;
        println!(
            "\n{} Pass {}: {} attackable instances",
            "→".bright_blue(),
            pass.pass + 1,
            pass.attackable_count
        );
        for (id, outcome) in &pass.outcomes {
            match outcome {
                ObfuscationOutcome::SuppressedSelf { slot } => {
                    println!("  {} {:#05x}: suppressed own instance {}", "✓".green(), id, slot);
                }
                ObfuscationOutcome::SuppressedUpstream { id: upstream, slot } => {
                    println!(
                        "  {} {:#05x}: shifted skip to {:#05x} instance {}",
                        "✓".green(),
                        id,
                        upstream,
                        slot
                    );
                }
                ObfuscationOutcome::PrioritySwapped { with_id } => {
                    println!(
                        "  {} {:#05x}: swapped priority with {:#05x}",
                        "✓".yellow(),
                        id,
                        with_id
                    );
                }
                ObfuscationOutcome::Unchanged => {
                    println!("  {} {:#05x}: unchanged", "→".bright_black(), id);
                }
            }
        }
        print_candidate_state(&registry);
        summary.passes.push(pass);
    }

    println!();
    println!("{}", "FINAL CANDIDATE STATE".cyan().bold());
    println!("{}", "───────────────────────────────────────────────".cyan());
    print_candidate_state(&registry);
    println!();

    write_report(report_path, &registry)?;
    println!(
        "{} Final candidates saved to {}",
        "✓".green().bold(),
        report_path
    );
    println!(
        "{} {} attackable instances remain after obfuscation",
        "→".bright_blue(),
        summary.final_attackable_count()
    );
    Ok(())
}

/// One status line plus the skip pattern per candidate, in registry order.
fn print_candidate_state(registry: &CandidateRegistry) {
    for candidate in &registry.candidates {
        let attackable = candidate.instances.iter().filter(|i| i.attackable).count();
        println!(
            "{} {:#05x}  period {:.3} s  mean window {} bits  {} of {} attackable  {} suppressed",
            "•".bright_blue(),
            candidate.id,
            candidate.period,
            candidate.mean_window_len(),
            attackable,
            candidate.instance_count,
            candidate.suppressed_count()
        );
        let pattern: String = candidate
            .pattern
            .iter()
            .map(|s| match s {
                SlotState::Active => '1',
                SlotState::Suppressed => '0',
            })
            .collect();
        println!("  pattern: {}", pattern);
    }
}
