use std::collections::VecDeque;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use arpa::{
    BatchResolver, CascadeOptions, ConvertOptions, Converter, Formatted, HeteronymTable, Lexicon,
    LineResult, PhonemeFormat, Resolver, TableInference, UnresolvedPolicy,
};
use tracing::info;

struct Args {
    /// Pronunciation dictionary to load.
    lexicon: String,

    /// Part-of-speech dependent pronunciations.
    heteronyms: Option<String>,

    /// Dictionary used as the out-of-vocabulary model.
    oov_lexicon: Option<String>,

    /// Text file to convert. Reads from stdin if not set.
    input: Option<String>,

    format: PhonemeFormat,
    unresolved: UnresolvedPolicy,

    /// Treat each input line as a single word and print its pronunciation.
    lookup: bool,

    /// Convert all lines in one batch.
    batch: bool,

    /// Print per-stage resolution counts to stderr.
    stats: bool,

    /// Enable verbose logging.
    verbose: bool,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = VecDeque::new();
    let mut lexicon = None;
    let mut heteronyms = None;
    let mut oov_lexicon = None;
    let mut format = PhonemeFormat::default();
    let mut unresolved = UnresolvedPolicy::default();
    let mut lookup = false;
    let mut batch = false;
    let mut stats = false;
    let mut verbose = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push_back(val.string()?),
            Short('l') | Long("lexicon") => lexicon = Some(parser.value()?.string()?),
            Long("heteronyms") => heteronyms = Some(parser.value()?.string()?),
            Long("oov-lexicon") => oov_lexicon = Some(parser.value()?.string()?),
            Short('f') | Long("format") => format = parser.value()?.parse()?,
            Short('u') | Long("unresolved") => unresolved = parser.value()?.parse()?,
            Long("lookup") => lookup = true,
            Short('b') | Long("batch") => batch = true,
            Short('s') | Long("stats") => stats = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('h') | Long("help") => {
                println!(
                    "Convert English text to ARPAbet pronunciations.

Usage: {bin_name} [OPTIONS] --lexicon <path> [file]

Reads lines from [file], or stdin if omitted, and writes each line with its
words replaced by pronunciations in braces.

  -l, --lexicon <path>       Pronunciation dictionary (text or JSON)
  --heteronyms <path>        JSON table of part-of-speech dependent words
  --oov-lexicon <path>       Dictionary used to infer unknown words

  -u, --unresolved <policy>  Unresolved words: keep, remove or drop
  -f, --format <format>      Format for --lookup: sds, sds_b or list
  --lookup                   Print the pronunciation of each input word

  -b, --batch                Convert all lines in a single batch
  -s, --stats                Print resolution counts per stage
  -v, --verbose              Enable verbose logging
  -h, --help                 Print help
",
                    bin_name = parser.bin_name().unwrap_or("arpa")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let lexicon = lexicon.ok_or("missing `--lexicon` arg")?;
    let input = values.pop_front();

    Ok(Args {
        lexicon,
        heteronyms,
        oov_lexicon,
        input,
        format,
        unresolved,
        lookup,
        batch,
        stats,
        verbose,
    })
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if verbose { "arpa=debug" } else { "arpa=warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()?;
    Ok(())
}

fn read_lines(input: Option<&str>) -> Result<Vec<String>, Box<dyn Error>> {
    let lines: Vec<String> = match input {
        Some(path) => fs::read_to_string(path)?
            .lines()
            .map(|line| line.to_string())
            .collect(),
        None => io::stdin().lock().lines().collect::<Result<_, _>>()?,
    };
    Ok(lines)
}

/// Write a converted line, or report why line `index` was skipped.
fn write_output(out: &mut impl Write, index: usize, output: LineResult) -> io::Result<()> {
    match output {
        Ok(Some(text)) => writeln!(out, "{}", text),
        Ok(None) => Ok(()),
        Err(err) => {
            eprintln!("line {}: {}", index + 1, err);
            Ok(())
        }
    }
}

fn print_stats(resolver: &Resolver) {
    eprintln!("{:<12} {:>9} {:>9}", "stage", "attempts", "successes");
    for (source, counts) in resolver.stats().snapshot() {
        eprintln!(
            "{:<12} {:>9} {:>9}",
            source.name(),
            counts.attempts,
            counts.successes
        );
    }
    let cache = resolver.cache();
    eprintln!(
        "cache: {} entries, {} hits / {} lookups",
        cache.len(),
        cache.hit_count(),
        cache.lookup_count()
    );
}

/// Convert text into ARPAbet pronunciations.
///
/// ```
/// cargo run -p arpa-cli --release -- --lexicon cmudict.dict input.txt
/// ```
///
/// Resolver stages can be toggled with the `ARPA_USE_CACHE`,
/// `ARPA_USE_INFERENCE` and `ARPA_MAX_DEPTH` env vars.
fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    init_logging(args.verbose)?;

    let load_start = Instant::now();
    let lexicon = Lexicon::load(&args.lexicon)?;
    let mut resolver =
        Resolver::new(Arc::new(lexicon)).with_options(CascadeOptions::from_env());
    if let Some(path) = &args.heteronyms {
        resolver = resolver.with_heteronyms(Arc::new(HeteronymTable::load(path)?));
    }
    if let Some(path) = &args.oov_lexicon {
        resolver = resolver.with_inference(Box::new(TableInference::new(Lexicon::load(path)?)));
    }
    info!(
        "loaded dictionaries in {:.1}ms",
        load_start.elapsed().as_secs_f64() * 1000.
    );

    let converter = Converter::new(resolver).with_options(ConvertOptions {
        format: args.format,
        unresolved: args.unresolved,
    });
    let lines = read_lines(args.input.as_deref())?;

    let mut stdout = io::stdout().lock();
    let convert_start = Instant::now();

    if args.lookup {
        for word in lines.iter().map(|line| line.trim()).filter(|w| !w.is_empty()) {
            match converter.lookup(word, None)? {
                Some(Formatted::Text(text)) => writeln!(stdout, "{}\t{}", word, text)?,
                Some(Formatted::Tokens(tokens)) => writeln!(stdout, "{}\t{:?}", word, tokens)?,
                None => writeln!(stdout, "{}\t", word)?,
            }
        }
    } else if args.batch {
        let (outputs, stats) = BatchResolver::new(&converter).convert_lines_with_stats(&lines);
        info!(
            "batch of {} lines ({} unique, {} rejected), tiers {:?}, {} inferred words",
            stats.lines, stats.unique_lines, stats.rejected, stats.tiers, stats.inferred_words
        );
        for (i, output) in outputs.into_iter().enumerate() {
            write_output(&mut stdout, i, output)?;
        }
    } else {
        for (i, line) in lines.iter().enumerate() {
            write_output(&mut stdout, i, converter.convert(line))?;
        }
    }

    info!(
        "converted {} lines in {:.1}ms",
        lines.len(),
        convert_start.elapsed().as_secs_f64() * 1000.
    );

    if args.stats {
        print_stats(converter.resolver());
    }

    Ok(())
}
