//! Randomized cross-checks of iterators and filter trees against set algebra.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sarissa_query::error::Result;
use sarissa_query::index::memory::{MemoryIndex, MemorySegment};
use sarissa_query::query::iterator::{DocId, DocIterator, PostingIterator, collect_docs, doc_limits};
use sarissa_query::query::*;
use sarissa_query::searcher::Searcher;

const MAX_DOC: DocId = 300;
const WORDS: [&str; 6] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

fn random_set(rng: &mut StdRng) -> BTreeSet<DocId> {
    let density = rng.random_range(0.0..0.3);
    (1..=MAX_DOC).filter(|_| rng.random_bool(density)).collect()
}

fn branches(sets: &[BTreeSet<DocId>]) -> Result<Vec<Box<dyn DocIterator>>> {
    sets.iter()
        .map(|set| {
            let docs: Vec<DocId> = set.iter().copied().collect();
            Ok(Box::new(PostingIterator::from_docs(&docs)?) as Box<dyn DocIterator>)
        })
        .collect()
}

fn at_least(sets: &[BTreeSet<DocId>], min_match: usize) -> Vec<DocId> {
    let min_match = min_match.max(1);
    (1..=MAX_DOC)
        .filter(|doc| sets.iter().filter(|set| set.contains(doc)).count() >= min_match)
        .collect()
}

/// Replay increasing seeks against `expected` and check every answer.
fn check_seeks(it: &mut dyn DocIterator, expected: &[DocId], rng: &mut StdRng) {
    let mut target = 0;
    while target < MAX_DOC + 5 {
        target += rng.random_range(0..40);
        let before = it.value();
        let want = if target <= before {
            before
        } else {
            expected
                .iter()
                .copied()
                .find(|&doc| doc >= target)
                .unwrap_or(doc_limits::EOF)
        };
        assert_eq!(it.seek(target), want, "seek({target}) from {before}");
        assert_eq!(it.value(), want);
    }
}

#[test]
fn test_composites_match_set_algebra() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let order = PreparedOrder::unordered();
    let config = QueryConfig::default();

    for round in 0..200 {
        let count = rng.random_range(0..8);
        let sets: Vec<BTreeSet<DocId>> = (0..count).map(|_| random_set(&mut rng)).collect();

        let union = at_least(&sets, 1);
        let mut it = make_disjunction(branches(&sets)?, &order, &config)?;
        assert_eq!(collect_docs(it.as_mut()), union, "union, round {round}");
        let mut it = make_disjunction(branches(&sets)?, &order, &config)?;
        check_seeks(it.as_mut(), &union, &mut rng);

        let intersection = at_least(&sets, count.max(1));
        let expected = if count == 0 { Vec::new() } else { intersection };
        let mut it = make_conjunction(branches(&sets)?, &order, &config)?;
        assert_eq!(collect_docs(it.as_mut()), expected, "intersection, round {round}");
        let mut it = make_conjunction(branches(&sets)?, &order, &config)?;
        check_seeks(it.as_mut(), &expected, &mut rng);

        let min_match = rng.random_range(0..=count + 1);
        let expected = if min_match > count { Vec::new() } else { at_least(&sets, min_match) };
        let mut it = make_min_match(branches(&sets)?, min_match, &order, &config)?;
        assert_eq!(
            collect_docs(it.as_mut()),
            expected,
            "{min_match} of {count}, round {round}"
        );
        let mut it = make_min_match(branches(&sets)?, min_match, &order, &config)?;
        check_seeks(it.as_mut(), &expected, &mut rng);

        if count >= 2 {
            let difference: Vec<DocId> = sets[0]
                .iter()
                .copied()
                .filter(|doc| !sets[1..].iter().any(|set| set.contains(doc)))
                .collect();
            let excluded = make_disjunction(branches(&sets[1..])?, &order, &config)?;
            let included = branches(&sets[..1])?.remove(0);
            let mut it = Exclusion::new(included, excluded);
            assert_eq!(collect_docs(&mut it), difference, "exclusion, round {round}");
        }
    }
    Ok(())
}

#[test]
fn test_union_strategies_are_indistinguishable() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let order = PreparedOrder::unordered();

    for _ in 0..100 {
        let count = rng.random_range(2..10);
        let sets: Vec<BTreeSet<DocId>> = (0..count).map(|_| random_set(&mut rng)).collect();
        let expected = at_least(&sets, 1);

        let mut small = SmallDisjunction::new(branches(&sets)?, order.clone())?;
        let mut heap = Disjunction::new(branches(&sets)?, order.clone())?;
        let mut threshold = MinMatchDisjunction::new(branches(&sets)?, 1, order.clone())?;
        assert_eq!(collect_docs(&mut small), expected);
        assert_eq!(collect_docs(&mut heap), expected);
        assert_eq!(collect_docs(&mut threshold), expected);
        assert_eq!(
            SmallDisjunction::new(branches(&sets)?, order.clone())?.cost(),
            Disjunction::new(branches(&sets)?, order.clone())?.cost()
        );

        let seed: u64 = rng.random();
        let mut small = SmallDisjunction::new(branches(&sets)?, order.clone())?;
        let mut heap = Disjunction::new(branches(&sets)?, order.clone())?;
        check_seeks(&mut small, &expected, &mut StdRng::seed_from_u64(seed));
        check_seeks(&mut heap, &expected, &mut StdRng::seed_from_u64(seed));
    }
    Ok(())
}

/// Live documents of one segment and the words each contains.
struct SegmentModel {
    docs: Vec<BTreeSet<&'static str>>,
    live: BTreeSet<DocId>,
}

impl SegmentModel {
    fn matching(&self, word: &str) -> BTreeSet<DocId> {
        self.live
            .iter()
            .copied()
            .filter(|&doc| self.docs[doc as usize - 1].contains(word))
            .collect()
    }

    /// Expected matches of `spec`, by plain set algebra.
    fn evaluate(&self, spec: &FilterSpec) -> BTreeSet<DocId> {
        match spec {
            FilterSpec::Term { term, .. } => self.matching(term),
            FilterSpec::And { children, .. } => {
                let mut sets = children.iter().map(|child| self.evaluate(child));
                let Some(first) = sets.next() else {
                    return BTreeSet::new();
                };
                sets.fold(first, |acc, set| &acc & &set)
            }
            FilterSpec::Or {
                children,
                min_match,
                ..
            } => {
                let sets: Vec<_> = children.iter().map(|child| self.evaluate(child)).collect();
                let min_match = (*min_match).max(1);
                self.live
                    .iter()
                    .copied()
                    .filter(|doc| sets.iter().filter(|set| set.contains(doc)).count() >= min_match)
                    .collect()
            }
            FilterSpec::Not { child, .. } => match child {
                Some(child) => &self.live - &self.evaluate(child),
                None => BTreeSet::new(),
            },
            FilterSpec::All { .. } => self.live.clone(),
            FilterSpec::Empty => BTreeSet::new(),
        }
    }
}

fn random_boost(rng: &mut StdRng) -> Boost {
    [0.5, 1.0, 1.0, 2.0][rng.random_range(0..4)]
}

fn random_filter(rng: &mut StdRng, depth: usize) -> FilterSpec {
    let leaf = depth == 0 || rng.random_bool(0.3);
    if leaf {
        return match rng.random_range(0..10) {
            0 => FilterSpec::All {
                boost: random_boost(rng),
            },
            1 => FilterSpec::Empty,
            2 => FilterSpec::Term {
                field: "body".to_string(),
                term: "missing".to_string(),
                boost: NO_BOOST,
            },
            _ => FilterSpec::Term {
                field: "body".to_string(),
                term: WORDS[rng.random_range(0..WORDS.len())].to_string(),
                boost: random_boost(rng),
            },
        };
    }

    let children = |rng: &mut StdRng| -> Vec<FilterSpec> {
        let count = rng.random_range(0..5);
        (0..count).map(|_| random_filter(rng, depth - 1)).collect()
    };
    match rng.random_range(0..3) {
        0 => FilterSpec::And {
            children: children(rng),
            boost: random_boost(rng),
        },
        1 => {
            let children = children(rng);
            FilterSpec::Or {
                min_match: rng.random_range(0..=children.len() + 1),
                children,
                boost: random_boost(rng),
            }
        }
        _ => FilterSpec::Not {
            child: Some(Box::new(random_filter(rng, depth - 1))),
            boost: random_boost(rng),
        },
    }
}

fn random_index(rng: &mut StdRng) -> Result<(MemoryIndex, Vec<SegmentModel>)> {
    let mut index = MemoryIndex::default();
    let mut models = Vec::new();

    for _ in 0..3 {
        let mut builder = MemorySegment::builder();
        let mut docs = Vec::new();
        for _ in 0..rng.random_range(1..60) {
            let words: BTreeSet<&'static str> = WORDS
                .iter()
                .copied()
                .filter(|_| rng.random_bool(0.35))
                .collect();
            let text: Vec<&str> = words.iter().copied().collect();
            builder.add_document([("body", text.join(" "))]);
            docs.push(words);
        }

        let mut segment = builder.build()?;
        let mut live: BTreeSet<DocId> = (1..=docs.len() as DocId).collect();
        for doc in 1..=docs.len() as DocId {
            if rng.random_bool(0.1) {
                segment.delete(doc)?;
                live.remove(&doc);
            }
        }
        index.push(segment);
        models.push(SegmentModel { docs, live });
    }
    Ok((index, models))
}

#[test]
fn test_filter_trees_match_set_algebra() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..20 {
        let (index, models) = random_index(&mut rng)?;
        let optimized = Searcher::new(Box::new(index));
        let unoptimized = Searcher::from_arc(Arc::clone(optimized.reader())).with_config(
            QueryConfig {
                optimize: false,
                ..QueryConfig::default()
            },
        )?;

        for _ in 0..25 {
            let spec = random_filter(&mut rng, 3);
            let expected: Vec<(usize, DocId)> = models
                .iter()
                .enumerate()
                .flat_map(|(ord, model)| model.evaluate(&spec).into_iter().map(move |doc| (ord, doc)))
                .collect();

            let filter = spec.clone().into_filter();
            for searcher in [&optimized, &unoptimized] {
                let results = searcher.search(filter.as_ref(), &Order::new(), usize::MAX)?;
                let mut found: Vec<(usize, DocId)> = results
                    .hits
                    .iter()
                    .map(|hit| (hit.segment, hit.doc_id))
                    .collect();
                found.sort_unstable();

                assert_eq!(
                    found,
                    expected,
                    "round {round}, optimize {}: {}",
                    searcher.config().optimize,
                    filter.description()
                );
                assert_eq!(searcher.count(filter.as_ref())?, expected.len() as u64);
            }
        }
    }
    Ok(())
}
