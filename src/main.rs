use clap::Parser;
use eprime2spm::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    // Without a subcommand, show an overview instead of an error
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let cancellation_token = CancellationToken::new();

        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to listen for CTRL+C: {}", e);
                std::future::pending::<()>().await;
            }
            cancellation_token.cancel();
        };

        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(eprime2spm::Error::processing_interrupted("Interrupted by user"))
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn show_help_and_commands() {
    println!("eprime2spm - E-Prime to SPM session converter");
    println!("=============================================");
    println!();
    println!("Convert E-Prime table exports into SPM names/onsets/durations scripts,");
    println!("contrast tables and behavioral summaries.");
    println!();
    println!("USAGE:");
    println!("    eprime2spm <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    convert         Convert logs of one study into SPM session files");
    println!("    contrasts       Spread session contrasts over four sessions");
    println!("    report          Turn an xjView cluster report into a table");
    println!("    widen-triggers  Hold EEG trigger codes over following samples");
    println!("    studies         List supported studies and their defaults");
    println!();
    println!("EXAMPLES:");
    println!("    eprime2spm convert --study roi logs/*.txt -o spm/");
    println!("    eprime2spm convert --study roi-dcm run-23.txt --blocks blocks.txt");
    println!("    eprime2spm contrasts contrasts.txt inclusion.txt -o global.txt");
    println!("    eprime2spm widen-triggers eeg.csv --triggers 1,2 --fs 500 -o wide.csv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    eprime2spm <COMMAND> --help");
}
