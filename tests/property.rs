//! Property tests over generated corpora, exercising the public API the way
//! a serving layer would: parse a spec, aggregate, window, summarize.

use std::collections::BTreeMap;

use proptest::prelude::*;

use concord::testing::{doc, explicit_token_hits};
use concord::{
    aggregate, Corpus, DocumentFilter, GroupingSpec, SortOrder, SummaryResponse, WindowSpec,
};

const TITLES: &[&str] = &["alpha", "beta", "ga:mma", "del;ta", "eps%ilon"];

/// Corpora with two attribute layers and awkward metadata values. Words carry
/// mixed case so insensitive grouping actually folds something.
fn corpus_strategy() -> impl Strategy<Value = Corpus> {
    let word = prop::sample::select(vec!["Aap", "aap", "Noot", "mies", "WIM"]);
    let doc_tokens = prop::collection::vec(word, 1..15);
    prop::collection::vec((doc_tokens, 0..TITLES.len()), 1..6).prop_map(|docs| {
        let documents = docs
            .into_iter()
            .map(|(tokens, title_idx)| {
                let lemmas: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
                let lemma_refs: Vec<&str> = lemmas.iter().map(String::as_str).collect();
                doc(
                    &[("word", &tokens), ("lemma", &lemma_refs)],
                    &[("title", TITLES[title_idx])],
                )
            })
            .collect();
        match Corpus::new(
            vec!["word".to_string(), "lemma".to_string()],
            vec!["title".to_string()],
            documents,
        ) {
            Ok(corpus) => corpus,
            Err(e) => panic!("generated corpus invalid: {}", e),
        }
    })
}

fn spec_strategy() -> impl Strategy<Value = GroupingSpec> {
    prop::sample::select(vec![
        "hit:word:i",
        "hit:word:s",
        "hit:lemma:i",
        "wordleft:word:i",
        "wordright:lemma:s",
        "hit-2:word:i",
        "hit+2:word:i",
        "field:title",
        "hit:word:i,field:title",
    ])
    .prop_map(|s| s.parse().unwrap())
}

fn run(
    corpus: &Corpus,
    unconstrained: bool,
    spec: &GroupingSpec,
    sort: &SortOrder,
    window: &WindowSpec,
) -> SummaryResponse {
    let hits = if unconstrained {
        corpus.all_token_hits()
    } else {
        explicit_token_hits(corpus)
    };
    aggregate(
        corpus,
        &hits,
        spec,
        &DocumentFilter::All,
        sort,
        window,
        BTreeMap::new(),
    )
    .unwrap()
}

proptest! {
    /// The frequency path must be indistinguishable from the regular path in
    /// the full response, for every spec it is licensed to take.
    #[test]
    fn fast_path_is_invisible_in_the_response(corpus in corpus_strategy()) {
        for spec_name in ["hit:word:i", "hit:word:s", "hit:lemma:i"] {
            let spec: GroupingSpec = spec_name.parse().unwrap();
            let fast = run(&corpus, true, &spec, &SortOrder::default(), &WindowSpec::default());
            let regular = run(&corpus, false, &spec, &SortOrder::default(), &WindowSpec::default());
            prop_assert_eq!(fast, regular);
        }
    }

    /// Group sizes always partition the hit total, whatever the spec.
    #[test]
    fn sizes_partition_the_hits(corpus in corpus_strategy(), spec in spec_strategy()) {
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let response = run(&corpus, false, &spec, &SortOrder::default(), &all);
        let sum: u64 = response.hit_groups.iter().map(|g| g.size).sum();
        prop_assert_eq!(sum, response.summary.number_of_hits);
        prop_assert_eq!(
            response.hit_groups.len() as u64,
            response.summary.number_of_groups
        );
    }

    /// Serialized identities are unique within a result, even when display
    /// labels collide (metadata values contain the wire separators).
    #[test]
    fn identities_are_unique(corpus in corpus_strategy(), spec in spec_strategy()) {
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let response = run(&corpus, false, &spec, &SortOrder::default(), &all);
        let mut identities: Vec<&str> =
            response.hit_groups.iter().map(|g| g.identity.as_str()).collect();
        identities.sort_unstable();
        let before = identities.len();
        identities.dedup();
        prop_assert_eq!(before, identities.len());
    }

    /// Every sort order yields the same group set; only the order differs.
    #[test]
    fn sorting_permutes_but_never_alters_groups(corpus in corpus_strategy()) {
        let spec: GroupingSpec = "hit:word:i".parse().unwrap();
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let baseline = run(&corpus, false, &spec, &SortOrder::default(), &all);

        for sort_name in ["identity", "-identity", "-size,identity", "numdocs", "-numdocs"] {
            let sort: SortOrder = sort_name.parse().unwrap();
            let sorted = run(&corpus, false, &spec, &sort, &all);
            prop_assert_eq!(&sorted.summary, &baseline.summary);

            let mut a: Vec<HitGroupKey> = sorted.hit_groups.iter().map(key_of).collect();
            let mut b: Vec<HitGroupKey> = baseline.hit_groups.iter().map(key_of).collect();
            a.sort();
            b.sort();
            prop_assert_eq!(a, b);
        }

        // Spot-check the orderings themselves.
        let by_identity = run(&corpus, false, &spec, &"identity".parse().unwrap(), &all);
        let idents: Vec<&String> = by_identity.hit_groups.iter().map(|g| &g.identity).collect();
        prop_assert!(idents.windows(2).all(|w| w[0] <= w[1]));

        let by_size = run(&corpus, false, &spec, &"-size,identity".parse().unwrap(), &all);
        let sizes: Vec<u64> = by_size.hit_groups.iter().map(|g| g.size).collect();
        prop_assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Consecutive windows reassemble the full sorted list exactly.
    #[test]
    fn windows_tile_the_group_list(corpus in corpus_strategy(), size in 1u64..4) {
        let spec: GroupingSpec = "hit:word:s".parse().unwrap();
        let sort = SortOrder::default();
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let full = run(&corpus, false, &spec, &sort, &all);

        let mut reassembled = Vec::new();
        let mut first = 0u64;
        loop {
            let page = run(
                &corpus,
                false,
                &spec,
                &sort,
                &WindowSpec { first_result: first, requested_size: size },
            );
            prop_assert_eq!(page.summary.window_first_result, first);
            prop_assert_eq!(page.summary.window_has_previous, first > 0);
            reassembled.extend(page.hit_groups.iter().map(key_of));
            if !page.summary.window_has_next {
                break;
            }
            first += size;
        }
        let expected: Vec<HitGroupKey> = full.hit_groups.iter().map(key_of).collect();
        prop_assert_eq!(reassembled, expected);
    }

    /// Field groupings report subcorpus sizes bounded by the whole corpus.
    #[test]
    fn subcorpus_sizes_stay_in_bounds(corpus in corpus_strategy()) {
        let spec: GroupingSpec = "field:title".parse().unwrap();
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let response = run(&corpus, false, &spec, &SortOrder::default(), &all);

        let total_docs = corpus.num_docs() as u64;
        let total_tokens: u64 = corpus.doc_ids().map(|d| corpus.doc_len(d) as u64).sum();
        let mut docs_sum = 0;
        let mut tokens_sum = 0;
        for group in &response.hit_groups {
            let sub = group.subcorpus_size.unwrap();
            prop_assert!(sub.documents >= group.number_of_docs);
            docs_sum += sub.documents;
            tokens_sum += sub.tokens;
        }
        // Title groups partition the corpus: every doc has exactly one title.
        prop_assert_eq!(docs_sum, total_docs);
        prop_assert_eq!(tokens_sum, total_tokens);
    }

    /// Case-insensitive grouping never has more groups than case-sensitive,
    /// and both see the same number of hits.
    #[test]
    fn insensitive_grouping_coarsens_sensitive(corpus in corpus_strategy()) {
        let all = WindowSpec { first_result: 0, requested_size: u64::MAX };
        let sensitive = run(
            &corpus, false, &"hit:word:s".parse().unwrap(), &SortOrder::default(), &all,
        );
        let insensitive = run(
            &corpus, false, &"hit:word:i".parse().unwrap(), &SortOrder::default(), &all,
        );
        prop_assert!(insensitive.summary.number_of_groups <= sensitive.summary.number_of_groups);
        prop_assert_eq!(insensitive.summary.number_of_hits, sensitive.summary.number_of_hits);
    }
}

type HitGroupKey = (String, u64, u64);

fn key_of(group: &concord::HitGroup) -> HitGroupKey {
    (group.identity.clone(), group.size, group.number_of_docs)
}
