//! Solver behavior on counted trees: monotonic pruning, fixed points, BIC
//! gating and relabeling symmetry.

use rstest::rstest;

use vlmc::solvers::{BicScore, BicSolver, ScoreTree};
use vlmc::testing::{
    alternating_sample, assert_tree_invariants, periodic_sample, uniform_sample, ContextSource,
};
use vlmc::{
    ContextNode, ContextTree, FitLogger, Parallelism, Pruner, PruningMethod, SampleCounter,
    SymbolId, Verbosity, Vocabulary,
};

fn counted(max_order: usize, sample: &[SymbolId], make_admissible: bool) -> ContextTree {
    let mut tree = ContextTree::new(max_order, Vocabulary::new(["0", "1"]).unwrap()).unwrap();
    SampleCounter::new(make_admissible)
        .fit(&mut tree, sample, Parallelism::Sequential)
        .unwrap();
    tree
}

fn prune(method: &PruningMethod, tree: &mut ContextTree, sample: &[SymbolId]) {
    method
        .apply(tree, sample, &FitLogger::new(Verbosity::Silent))
        .unwrap();
}

fn shape(tree: &ContextTree) -> Vec<(Vec<SymbolId>, bool)> {
    tree.nodes()
        .map(|n| (n.context().to_vec(), n.is_leaf()))
        .collect()
}

fn samples() -> Vec<Vec<SymbolId>> {
    vec![
        alternating_sample(60),
        periodic_sample(90, &[0, 0, 1, 1, 1]),
        uniform_sample(300, 2, 5),
        ContextSource::binary_order_two().simulate(800, 17),
    ]
}

#[rstest]
#[case::bic(PruningMethod::bic())]
#[case::context(PruningMethod::context_algorithm())]
#[case::bct(PruningMethod::bct(0.5))]
#[case::bct_low_beta(PruningMethod::bct(0.1))]
fn pruning_is_monotonic_and_idempotent(
    #[case] method: PruningMethod,
    #[values(true, false)] make_admissible: bool,
) {
    for sample in samples() {
        let mut tree = counted(4, &sample, make_admissible);
        let depth_before = tree.depth();
        let nodes_before = tree.n_nodes();

        prune(&method, &mut tree, &sample);
        assert!(tree.depth() <= depth_before);
        assert!(tree.n_nodes() <= nodes_before);
        assert_tree_invariants(&tree);

        let once = shape(&tree);
        prune(&method, &mut tree, &sample);
        assert_eq!(shape(&tree), once, "{} is not a fixed point", method.kind());
    }
}

#[rstest]
#[case::bic(PruningMethod::bic())]
#[case::context(PruningMethod::context_algorithm())]
#[case::bct(PruningMethod::bct(0.5))]
fn pruning_keeps_retained_counts(#[case] method: PruningMethod) {
    let sample = ContextSource::binary_order_two().simulate(1_000, 3);
    let before = counted(4, &sample, true);
    let mut after = before.clone();
    prune(&method, &mut after, &sample);

    for node in after.nodes() {
        let original = before.node(node.context()).unwrap();
        assert_eq!(node.occurrence_count(), original.occurrence_count());
        assert_eq!(node.transition_counts(), original.transition_counts());
    }
}

/// Contexts preferring to split below an ancestor that prefers to stop.
fn vetoed_contexts(tree: &ContextTree, scores: &ScoreTree<BicScore>) -> Vec<Vec<SymbolId>> {
    fn walk(
        node: &ContextNode,
        score: &ScoreTree<BicScore>,
        blocked: bool,
        out: &mut Vec<Vec<SymbolId>>,
    ) {
        if blocked && score.value.chi {
            out.push(node.context().to_vec());
        }
        for child in node.iter_children() {
            let key = child.context()[0];
            walk(child, &score.children[&key], blocked || !score.value.chi, out);
        }
    }
    let mut out = Vec::new();
    walk(tree.root(), scores, false, &mut out);
    out
}

#[test]
fn bic_prunes_everything_below_a_stopping_node() {
    for sample in samples() {
        let before = counted(4, &sample, false);
        let scores = BicSolver.score(&before, sample.len());
        let mut after = before.clone();
        prune(&PruningMethod::bic(), &mut after, &sample);

        for node in before.nodes() {
            if scores.get(node.context()).unwrap().value.chi {
                continue;
            }
            // a stopping node survives as a leaf or not at all
            if let Some(kept) = after.node(node.context()) {
                assert!(kept.is_leaf());
            }
        }
    }
}

#[test]
fn bic_stopping_root_vetoes_a_splitting_descendant() {
    // "0001" repeated: "0" gains from a second symbol of context, the root
    // does not gain enough from the first
    let sample = periodic_sample(20, &[0, 0, 0, 1]);
    let before = counted(2, &sample, false);
    let scores = BicSolver.score(&before, sample.len());

    assert!(!scores.value.chi);
    assert!(scores.get(&[0]).unwrap().value.chi);
    assert_eq!(vetoed_contexts(&before, &scores), vec![vec![0]]);

    let mut after = before.clone();
    prune(&PruningMethod::bic(), &mut after, &sample);
    assert!(after.root().is_leaf());
    assert!(after.node(&[0]).is_none());
    assert!(after.node(&[0, 0]).is_none());
}

#[rstest]
#[case::admissible(true)]
#[case::full(false)]
fn bct_is_symmetric_under_relabeling(#[case] make_admissible: bool) {
    let sample = alternating_sample(20);
    let relabeled: Vec<SymbolId> = sample.iter().map(|&s| 1 - s).collect();

    let mut tree = counted(2, &sample, make_admissible);
    let mut mirror = counted(2, &relabeled, make_admissible);
    prune(&PruningMethod::bct(0.5), &mut tree, &sample);
    prune(&PruningMethod::bct(0.5), &mut mirror, &relabeled);

    for node in tree.nodes() {
        let flipped: Vec<SymbolId> = node.context().iter().map(|&s| 1 - s).collect();
        let twin = mirror.node(&flipped).unwrap();
        assert_eq!(node.is_leaf(), twin.is_leaf());
    }
    assert_eq!(tree.n_nodes(), mirror.n_nodes());

    let zero = tree.node(&[0]).unwrap();
    let one = tree.node(&[1]).unwrap();
    assert_eq!(zero.is_leaf(), one.is_leaf());
}

#[test]
fn constant_sample_collapses_under_every_method() {
    let sample = vec![1; 100];
    for method in ["bic", "context", "bct"] {
        let method: PruningMethod = method.parse().unwrap();
        let mut tree = counted(3, &sample, false);
        prune(&method, &mut tree, &sample);
        assert!(tree.root().is_leaf(), "{} kept a split", method.kind());
    }
}
