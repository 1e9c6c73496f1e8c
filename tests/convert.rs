use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use arpa::cascade::{Source, Strategy};
use arpa::format::{from_bracketed, to_bracketed};
use arpa::pos::SuffixTagger;
use arpa::{
    BatchResolver, BraceError, ConvertError, ConvertOptions, Converter, HeteronymTable, Lexicon,
    Origin, PhonemeFormat, Pronunciation, Resolver, UnresolvedPolicy,
};

fn test_file_path(name: &str) -> PathBuf {
    let mut abs_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    abs_path.push("test-data/");
    abs_path.push(name);
    abs_path
}

/// Create a resolver using the dictionaries in `test-data/`.
fn load_resolver() -> Result<Resolver, Box<dyn Error>> {
    let lexicon = Lexicon::load(test_file_path("lexicon.dict"))?;
    let heteronyms = HeteronymTable::load(test_file_path("heteronyms.json"))?;
    let tagger = SuffixTagger::new()
        .with_word("read", "VBD")
        .with_word("lead", "VB");

    Ok(Resolver::new(Arc::new(lexicon))
        .with_heteronyms(Arc::new(heteronyms))
        .with_tagger(Box::new(tagger)))
}

fn load_converter(unresolved: UnresolvedPolicy) -> Result<Converter, Box<dyn Error>> {
    let opts = ConvertOptions {
        format: PhonemeFormat::SdsBracketed,
        unresolved,
    };
    Ok(Converter::new(load_resolver()?).with_options(opts))
}

fn resolve(resolver: &Resolver, word: &str) -> Result<Option<String>, Box<dyn Error>> {
    Ok(resolver.resolve(word, None)?.map(|pron| pron.to_string()))
}

#[test]
fn test_load_test_dictionaries() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;
    assert_eq!(resolver.lexicon().len(), 17);
    assert_eq!(resolver.heteronyms().len(), 2);
    assert_eq!(
        resolver.lexicon().variants("the").map(|v| v.len()),
        Some(2)
    );
    Ok(())
}

#[test]
fn test_convert_sentence() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Keep)?;
    let output = converter.convert("The cat read the book.")?;
    assert_eq!(
        output.as_deref(),
        Some("{DH AH0} {K AE1 T} {R EH1 D} {DH AH0} {B UH1 K}.")
    );
    Ok(())
}

#[test]
fn test_unresolved_policies() -> Result<(), Box<dyn Error>> {
    let line = "She saw a zorblax quickly.";

    let keep = load_converter(UnresolvedPolicy::Keep)?.convert(line)?;
    assert_eq!(
        keep.as_deref(),
        Some("{SH IY1} {S AO1} {AH0} zorblax {K W IH1 K L IY0}.")
    );

    let remove = load_converter(UnresolvedPolicy::Remove)?.convert(line)?;
    assert_eq!(
        remove.as_deref(),
        Some("{SH IY1} {S AO1} {AH0} {K W IH1 K L IY0}.")
    );

    let drop = load_converter(UnresolvedPolicy::Drop)?.convert(line)?;
    assert_eq!(drop, None);

    Ok(())
}

#[test]
fn test_escaped_regions_are_preserved() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Remove)?;
    let output = converter.convert("The {K AE1 T} and the cat.")?;
    assert_eq!(
        output.as_deref(),
        Some("{DH AH0} {K AE1 T} {DH AH0} {K AE1 T}.")
    );
    Ok(())
}

#[test]
fn test_heteronyms_follow_part_of_speech() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Keep)?;

    // "lead" is pinned to VB, which falls back to the VERB entry.
    let output = converter.convert("Lead the dog.")?;
    assert_eq!(output.as_deref(), Some("{L IY1 D} {DH AH0} {D AO1 G}."));

    let resolver = converter.resolver();
    assert_eq!(resolve(resolver, "read")?.as_deref(), Some("R IY1 D"));
    assert_eq!(
        resolver.resolve("read", Some("VBN"))?.map(|p| p.to_string()),
        Some("R EH1 D".to_string())
    );
    assert_eq!(
        resolver.resolve("lead", Some("NNS"))?.map(|p| p.to_string()),
        Some("L EH1 D".to_string())
    );
    // No key matches and there is no default entry.
    assert_eq!(resolver.resolve("lead", Some("JJ"))?, None);
    Ok(())
}

#[test]
fn test_possessive_suffixes() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;

    let cases = [
        // Voiceless endings take S.
        ("cat's", "K AE1 T S"),
        ("truck's", "T R AH1 K S"),
        // Voiced endings take Z.
        ("dog's", "D AO1 G Z"),
        // Vowel endings take Z.
        ("she's", "SH IY1 Z"),
        // Sibilant endings take IH0 Z.
        ("bus's", "B AH1 S IH0 Z"),
        ("church's", "CH ER1 CH IH0 Z"),
    ];

    for (word, expected) in cases {
        assert_eq!(resolve(&resolver, word)?.as_deref(), Some(expected), "{}", word);
    }
    Ok(())
}

#[test]
fn test_derived_forms() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;

    let cases = [
        ("she'll", "SH IY1 AH0 L"),
        ("she'd", "SH IY1 D"),
        ("sunflower", "S AH1 N F L AW1 ER0"),
        ("cats", "K AE1 T S"),
        ("potatoes", "P AH0 T EY1 T OW2 Z"),
        ("sunflowers", "S AH1 N F L AW1 ER0 Z"),
        ("quickly", "K W IH1 K L IY0"),
        ("taking", "T EY1 K IH0 NG"),
    ];

    for (word, expected) in cases {
        assert_eq!(resolve(&resolver, word)?.as_deref(), Some(expected), "{}", word);
    }

    assert_eq!(resolve(&resolver, "zorblax")?, None);
    Ok(())
}

#[test]
fn test_variant_index() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;
    assert_eq!(
        resolve(&resolver, "console")?.as_deref(),
        Some("K AA1 N S OW0 L")
    );
    assert_eq!(
        resolve(&resolver, "console(2)")?.as_deref(),
        Some("K AH0 N S OW1 L")
    );
    assert_eq!(
        resolve(&resolver, "CONSOLE(9)")?.as_deref(),
        Some("K AH0 N S OW1 L")
    );
    Ok(())
}

#[test]
fn test_hyphenated_takes_priority() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;
    let res = resolver
        .resolve_with_origin("well-taking", None)?
        .ok_or("word not resolved")?;
    assert_eq!(res.pron.to_string(), "W EH1 L T EY1 K IH0 NG");
    assert_eq!(
        res.origin,
        Origin::Derived(Source::Strategy(Strategy::Hyphenated))
    );
    Ok(())
}

#[test]
fn test_malformed_braces() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Keep)?;

    let err = converter.convert("The {K AE1 T sat").err();
    assert!(matches!(
        err,
        Some(ConvertError::BraceError(BraceError::UnmatchedOpen(_)))
    ));

    let err = converter.convert("The cat} sat").err();
    assert!(matches!(
        err,
        Some(ConvertError::BraceError(BraceError::UnmatchedClose(_)))
    ));

    let err = converter.convert("{K {AE1} T}").err();
    assert!(matches!(
        err,
        Some(ConvertError::BraceError(BraceError::Nested(_)))
    ));

    Ok(())
}

#[test]
fn test_bracketed_output_parses() -> Result<(), Box<dyn Error>> {
    let resolver = load_resolver()?;
    let pron = resolver
        .resolve("well-taking", None)?
        .ok_or("word not resolved")?;
    let bracketed = to_bracketed(&pron);
    assert_eq!(bracketed, "{W EH1 L T EY1 K IH0 NG}");
    assert_eq!(from_bracketed(&bracketed)?, pron);
    assert!(from_bracketed("{W EH1 L XX}").is_err());

    let joined = Pronunciation::join(&[pron.clone(), pron]);
    assert_eq!(joined.len(), 16);
    Ok(())
}

#[test]
fn test_batch_matches_line_by_line() -> Result<(), Box<dyn Error>> {
    let lines = [
        "The cat read the book.",
        "The {K AE1 T} sat on a bus.",
        "She saw a zorblax quickly.",
        "The cat read the book.",
        "Lead the dogs to church.",
        "",
        "Sunflowers and potatoes, 3 cats!",
        "A well-taking console.",
    ];

    for policy in [
        UnresolvedPolicy::Keep,
        UnresolvedPolicy::Remove,
        UnresolvedPolicy::Drop,
    ] {
        let single = load_converter(policy)?;
        let expected = lines
            .iter()
            .map(|line| single.convert(line))
            .collect::<Result<Vec<_>, _>>()?;

        let batch_converter = load_converter(policy)?;
        let (actual, stats) =
            BatchResolver::new(&batch_converter).convert_lines_with_stats(&lines);
        let actual = actual.into_iter().collect::<Result<Vec<_>, _>>()?;

        assert_eq!(actual, expected, "policy {:?}", policy);
        assert_eq!(stats.lines, lines.len());
        assert_eq!(stats.unique_lines, lines.len() - 1);
        assert_eq!(stats.tiers.iter().sum::<usize>(), stats.unique_lines);
        assert_eq!(stats.rejected, 0);
    }

    Ok(())
}

#[test]
fn test_batch_keeps_lines_around_brace_errors() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Keep)?;
    let results = BatchResolver::new(&converter).convert_lines(&[
        "The cat.",
        "The {cat.",
        "The book.",
        "The {cat.",
    ]);

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap().as_deref(), Some("{DH AH0} {K AE1 T}."));
    assert_eq!(results[2].as_ref().unwrap().as_deref(), Some("{DH AH0} {B UH1 K}."));
    for result in [&results[1], &results[3]] {
        assert!(matches!(
            result,
            Err(ConvertError::BraceError(BraceError::UnmatchedOpen(_)))
        ));
    }
    Ok(())
}

#[test]
fn test_underscore_separates_words() -> Result<(), Box<dyn Error>> {
    let converter = load_converter(UnresolvedPolicy::Keep)?;
    let output = converter.convert("cat_dog")?;
    assert_eq!(output.as_deref(), Some("{K AE1 T}_{D AO1 G}"));
    Ok(())
}
