use super::*;

#[test]
fn test_binary_order() {
    let empty = Binary::default();
    let a = Binary::from("a");
    let aa = Binary::from("aa");
    let b = Binary::from("b");

    assert!(empty < a);
    assert!(a < aa);
    assert!(aa < b);
    assert!(Binary::from(vec![0_u8]) > empty);
    assert!(Binary::from(vec![0xff_u8]) > Binary::from(vec![0x7f_u8]));
    assert_eq!(a, Binary::from(vec![b'a']));
}

#[test]
fn test_binary_concat() {
    let val = Binary::from("hello").concat(Binary::from(" world"));
    assert_eq!(val, Binary::from("hello world"));
    assert_eq!(val.len(), 11);
    assert!(!val.is_empty());
    assert!(Binary::default().is_empty());
}

#[test]
fn test_binary_debug() {
    let val = Binary::from(vec![b'o', b'k', 0x00_u8, b'\n']);
    assert_eq!(format!("{:?}", val), "b\"ok\\x00\\n\"");
}
