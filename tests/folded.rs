use mailtree::{parse, TransferEncoding};

#[test]
fn folded_headers() {
    let raw_mail: &[u8] = br#"From: me <me@myself>
To: "Distribution List": "Henry" <henry@example>, <dick@example>, Tom
	<tom@example>;
 <offlist@example>;
	 	<lastone@example>
Subject:
	Hello
Date: Wed,
 31 May 2023 10:17:28 +0200

Hi there!

Bye"#;
    let mut msg = parse(raw_mail);
    let root = msg.root();
    let part = msg.part(root);
    assert_eq!(part.content_type(), Some("text/plain"));
    assert!(part.is_text());
    assert_eq!(part.charset(), Some("us-ascii"));
    assert!(!part.is_multipart());
    assert_eq!(part.content_disposition(), "inline");
    assert!(part.is_inline());
    assert!(matches!(part.transfer_encoding(), TransferEncoding::SevenBit));
    assert_eq!(part.content_transfer_encoding(), None);
    assert!(!part.has_invalid_headers());
    assert!(!part.has_duplicate_header("from"));
    assert!(!part.has_duplicate_header("to"));
    assert!(!part.has_duplicate_header("subject"));
    assert!(!part.has_duplicate_header("date"));
    assert!(!part.is_resent());
    assert!(!part.is_list());
    assert_eq!(part.names().len(), 0);
    assert_eq!(part.collect_header_flaws(), (false, false, false, false, false));
    assert_eq!(part.get_header("from").unwrap().value, "me <me@myself>");
    assert_eq!(
        part.get_header("to").unwrap().value,
        r#""distribution list": "henry" <henry@example>, <dick@example>, tom <tom@example>; <offlist@example>; <lastone@example>"#
    );
    assert_eq!(part.get_header("subject").unwrap().value, "hello");
    assert!(!part.is_attachment_with_charset());
    assert!(msg.next_child(root).unwrap().is_none());
}
