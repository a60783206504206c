use mailtree::{parse, TransferEncoding};

#[test]
fn text_decoding() {
    let raw_mail: &[u8] = b"\
From: me
To: You
To: You
Subject: Same line, different encoding
Mime-version: 1.0
Content-type: multipart/mixed; boundary=bound

--bound
Content-type: text/plain; charset=iso-8859-15
Content-transfer-encoding: quoted-printable
Content-disposition: inline

The euro sign: =A4=
--bound
Content-type: text/plain; charset=iso-8859-15
Content-transfer-encoding: base64
Content-disposition: inline

VGhlIGV1cm8gc2lnbjogpA==
--bound
Content-type: text/plain; charset=utf-8
Content-transfer-encoding: quoted-printable
Content-disposition: inline

The euro sign: =e2=82=ac=
--bound
Content-type: text/plain; charset=utf-8
Content-transfer-encoding: base64
Content-disposition: inline

VGhlIGV1cm8gc2lnbjog4oKs
--bound
Content-type: application/octet-stream; charset=iso-8859-15;
	name=attm.txt
Content-transfer-encoding: quoted-printable
Content-disposition: attachment; filename=\"Attachment.txt\"

The euro sign: =A4=
--bound
Content-type: application/octet-stream; charset=iso-8859-15;
	name=attm.txt
Content-transfer-encoding: base64
Content-disposition: attachment; filename=\"Attachment.txt\"

VGhlIGV1cm8gc2lnbjogpA==
--bound--
    ";
    let outref = "The euro sign: \u{20ac}";
    let mut msg = parse(raw_mail);
    let root = msg.root();
    assert!(!msg.part(root).is_text());
    assert!(msg.part(root).is_multipart());
    assert!(!msg.part(root).has_invalid_headers());
    assert!(!msg.part(root).has_duplicate_header("from"));
    assert!(msg.part(root).has_duplicate_header("to"));
    assert!(!msg.part(root).has_duplicate_header("subject"));
    assert!(!msg.part(root).is_resent());
    assert!(!msg.part(root).is_list());

    // -- part 1: iso-8859-15, quoted-printable
    let part1 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(part1);
        assert!(part.is_text());
        assert!(!part.is_multipart());
        assert!(!part.has_invalid_headers());
        assert_eq!(part.charset(), Some("iso-8859-15"));
        assert_eq!(part.content_disposition(), "inline");
        assert!(part.is_inline());
        assert!(matches!(part.transfer_encoding(), TransferEncoding::QuotedPrintable));
        assert_eq!(part.content_transfer_encoding(), Some("quoted-printable"));
        assert_eq!(part.names().len(), 0);
        assert_eq!(part.collect_header_flaws(), (false, false, false, false, false));
        assert!(!part.is_attachment_with_charset());
    }
    assert_eq!(msg.text(part1).unwrap(), outref);

    // -- part 2: iso-8859-15, base64
    let part2 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(part2);
        assert!(part.is_text());
        assert_eq!(part.charset(), Some("iso-8859-15"));
        assert!(matches!(part.transfer_encoding(), TransferEncoding::Base64));
        assert_eq!(part.content_transfer_encoding(), Some("base64"));
        assert!(!part.is_attachment_with_charset());
    }
    assert_eq!(msg.text(part2).unwrap(), outref);

    // -- part 3: utf-8, quoted-printable
    let part3 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(part3);
        assert_eq!(part.charset(), Some("utf-8"));
        assert!(matches!(part.transfer_encoding(), TransferEncoding::QuotedPrintable));
    }
    assert_eq!(msg.text(part3).unwrap(), outref);

    // -- part 4: utf-8, base64
    let part4 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(part4);
        assert_eq!(part.charset(), Some("utf-8"));
        assert!(matches!(part.transfer_encoding(), TransferEncoding::Base64));
    }
    assert_eq!(msg.text(part4).unwrap(), outref);

    // -- attachment 1: declares a charset but is not rendered as text
    let att1 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(att1);
        assert!(!part.is_text());
        assert_eq!(part.charset(), None);
        assert_eq!(part.content_disposition(), "attachment");
        assert!(!part.is_inline());
        assert!(matches!(part.transfer_encoding(), TransferEncoding::QuotedPrintable));
        assert_eq!(
            part.names(),
            vec!["attachment.txt".to_string(), "attm.txt".to_string()]
        );
        assert!(part.is_attachment_with_charset());
    }
    assert_eq!(msg.decoded_content(att1).unwrap(), b"The euro sign: \xa4");

    // -- attachment 2
    let att2 = msg.next_child(root).unwrap().unwrap();
    {
        let part = msg.part(att2);
        assert!(!part.is_text());
        assert!(matches!(part.transfer_encoding(), TransferEncoding::Base64));
        assert!(part.is_attachment_with_charset());
    }
    assert_eq!(msg.decoded_content(att2).unwrap(), b"The euro sign: \xa4");

    assert!(msg.next_child(root).unwrap().is_none());
}
