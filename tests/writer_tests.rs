//! Writer contract: forced UTF-8 declaration, 2-space pretty indentation,
//! trailing-newline rules, and idempotence in both modes.

use xylem::XmlDataFormat;

const EXAMPLE_XML: &str = "<order><product>Milk</product><product>Coffee</product></order>";

const FORMATTED_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order>\n  <product>Milk</product>\n  <product>Coffee</product>\n</order>\n";

const PLAIN_FORMATTED_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order>\n  <product>Milk</product>\n  <product>Coffee</product>\n</order>";

const PLAIN_XML: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order><product>Milk</product><product>Coffee</product></order>";

#[test]
fn pretty_formats_unformatted_input() {
    let format = XmlDataFormat::new();
    let order = format.parse_str(EXAMPLE_XML).unwrap();
    assert_eq!(order.to_xml().unwrap(), FORMATTED_XML);
}

#[test]
fn pretty_reproduces_formatted_input() {
    let format = XmlDataFormat::new();
    let order = format.parse_str(FORMATTED_XML).unwrap();
    assert_eq!(order.to_xml().unwrap(), FORMATTED_XML);
}

#[test]
fn plain_keeps_unformatted_input_as_is() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format.parse_str(EXAMPLE_XML).unwrap();
    assert_eq!(order.to_xml().unwrap(), PLAIN_XML);
}

#[test]
fn plain_keeps_formatted_input_as_is_without_trailing_newline() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format.parse_str(FORMATTED_XML).unwrap();
    assert_eq!(order.to_xml().unwrap(), PLAIN_FORMATTED_XML);
}

#[test]
fn both_modes_are_idempotent() {
    let pretty = XmlDataFormat::new();
    let once = pretty.parse_str(EXAMPLE_XML).unwrap().to_xml().unwrap();
    let twice = pretty.parse_str(&once).unwrap().to_xml().unwrap();
    assert_eq!(once, twice);

    let plain = XmlDataFormat::builder().pretty_print(false).build();
    let once = plain.parse_str(FORMATTED_XML).unwrap().to_xml().unwrap();
    let twice = plain.parse_str(&once).unwrap().to_xml().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn display_matches_to_xml() {
    let order = xylem::parse(EXAMPLE_XML).unwrap();
    assert_eq!(order.to_string(), order.to_xml().unwrap());
}

#[test]
fn write_to_emits_the_same_bytes() {
    let order = xylem::parse(EXAMPLE_XML).unwrap();
    let mut sink = Vec::new();
    order.write_to(&mut sink).unwrap();
    assert_eq!(sink, FORMATTED_XML.as_bytes());
}

#[test]
fn escaping_and_attribute_order_round_trip() {
    let input = "<a z=\"last &amp; first\" a=\"&quot;q&quot;\">1 &lt; 2</a>";
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let a = format.parse_str(input).unwrap();
    assert_eq!(
        a.to_xml().unwrap(),
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{input}")
    );
}

#[test]
fn preserve_space_names_keep_configured_subtrees() {
    let format = XmlDataFormat::builder().preserve_space(["code"]).build();
    let root = format
        .parse_str("<doc><code>  x  </code><p>  </p></doc>")
        .unwrap();
    assert_eq!(
        root.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><doc>\n  <code>  x  </code>\n  <p/>\n</doc>\n"
    );
}

#[test]
fn invalid_preserve_space_name_fails_every_pretty_write() {
    let format = XmlDataFormat::builder().preserve_space(["not a name"]).build();
    let root = format.parse_str("<doc/>").unwrap();
    assert!(matches!(
        root.to_xml(),
        Err(xylem::Error::TransformerCreationFailed(_))
    ));
    // still failing on retry, the cache was not populated
    assert!(root.to_xml().is_err());
}

#[test]
fn serialized_subtree_starts_at_the_handle() {
    let order = xylem::parse(EXAMPLE_XML).unwrap();
    let milk = order.xpath("/order/product[1]").element().unwrap();
    assert_eq!(
        milk.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><product>Milk</product>\n"
    );
}

#[test]
fn processing_instructions_survive_round_trips() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let root = format
        .parse_str("<doc><?target some data?><x/></doc>")
        .unwrap();
    assert_eq!(
        root.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><doc><?target some data?><x/></doc>"
    );
}
