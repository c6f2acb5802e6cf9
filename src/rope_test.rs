use super::*;

#[test]
fn test_rope() {
    let mut rope = Rope::new();
    assert_eq!(rope.size(), 0);

    rope.push(Binary::from("head"));
    rope.push_u32(7);
    rope.push_u64(13);
    assert_eq!(rope.size(), 4 + 4 + 8);

    let mut tail = Rope::new();
    tail.push(Binary::from("tail"));
    rope.merge(tail);
    assert_eq!(rope.size(), 20);

    let data = rope.into_bytes();
    assert_eq!(&data[..4], b"head");
    assert_eq!(&data[4..8], &7_u32.to_be_bytes());
    assert_eq!(&data[8..16], &13_u64.to_be_bytes());
    assert_eq!(&data[16..], b"tail");
}

#[test]
fn test_rope_empty_merge() {
    let mut rope = Rope::new();
    rope.merge(Rope::new());
    assert_eq!(rope.size(), 0);
    assert_eq!(rope.into_bytes(), Vec::<u8>::new());
}
