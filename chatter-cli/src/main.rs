use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use chatter_core::io::{corpus_name, open_corpus};
use chatter_core::model::generator::SentenceGenerator;
use chatter_core::model::trainer::{Corpus, Trainer};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Generate sentences from an n-gram model trained on text files.
#[derive(Parser, Debug)]
#[command(name = "chatter", version, about)]
struct Args {
    /// N-gram size (1 = unigram, 2 = bigram, ...).
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    n: usize,

    /// Number of sentences to generate.
    #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    sentences: usize,

    /// Text files to train on.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Abort a sentence once it reaches this many tokens.
    #[arg(long, default_value_t = 1000, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_tokens: usize,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Train the files on several threads.
    #[arg(long)]
    parallel: bool,

    /// Log progress information.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    run(&args)
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    // Check every file before spending time on training
    for (i, path) in args.files.iter().enumerate() {
        if !path.is_file() {
            return Err(format!("Filepath {} is invalid: {}", i + 1, path.display()).into());
        }
    }

    let process_start = Instant::now();

    let mut corpora = Vec::with_capacity(args.files.len());
    for path in &args.files {
        println!("Parsing {} . . .", path.display());
        corpora.push(Corpus::new(corpus_name(path)?, open_corpus(path)?));
    }

    let trainer = Trainer::new(args.n)?;
    let model = if args.parallel {
        trainer.train_corpora_parallel(corpora)?
    } else {
        trainer.train_corpora(corpora)?
    };

    for report in &model.summary.corpora {
        println!("{}: {} total tokens", report.name, report.tokens);
        println!("Parse time: {}ms\n", report.elapsed_ms);
    }
    println!("Total tokens: {}", model.summary.total_tokens);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!("\n\nGenerating {} sentences . . .\n", args.sentences);
    let generation_start = Instant::now();
    let generator = SentenceGenerator::new(&model.table).with_max_tokens(args.max_tokens);
    for i in 1..=args.sentences {
        println!("{}. {}", i, generator.generate_sentence(&mut rng)?);
    }

    println!("\nSentence generation time: {} ms", generation_start.elapsed().as_millis());
    println!("Total process time: {} ms", process_start.elapsed().as_millis());

    Ok(())
}
