use super::*;

#[test]
fn test_changeset() {
    let mut one = Changeset::new();
    assert!(one.is_empty());

    one.modify(Binary::from("a"), Binary::from("1"));
    one.remove(Binary::from("b"));
    assert_eq!(one.len(), 2);
    assert_eq!(one.as_ops()[0].as_key(), &Binary::from("a"));
    assert_eq!(one.as_ops()[1].as_key(), &Binary::from("b"));

    let mut two = Changeset::new();
    two.modify(Binary::from("c"), Binary::from("3"));

    // merge keeps operation order, front to back.
    let merged = one.merge(two);
    let ops: Vec<Op> = merged.into_iter().collect();
    assert_eq!(
        ops,
        vec![
            Op::modify(Binary::from("a"), Binary::from("1")),
            Op::remove(Binary::from("b")),
            Op::modify(Binary::from("c"), Binary::from("3")),
        ]
    );
}
