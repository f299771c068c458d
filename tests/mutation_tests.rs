//! Mutation engine: adoption across documents, batch semantics, attribute
//! writes, and handle identity.

use xylem::{Error, XmlDataFormat};

#[test]
fn appending_from_another_document_adopts_the_subtree() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order/>").unwrap();
    let other = format
        .parse_str("<catalog><product><flavor/></product></catalog>")
        .unwrap();
    let product = other.child_element("product").unwrap();

    order.append_child(&product).unwrap();

    // the handle followed the node into its new document
    assert_eq!(order.child_element("product").unwrap(), product);
    assert_eq!(product.child_element("flavor").unwrap().name(), "flavor");
    // the source document lost it
    assert!(matches!(
        other.child_element("product"),
        Err(Error::ChildElementNotFound { .. })
    ));
}

#[test]
fn clones_of_an_adopted_handle_follow_it() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order/>").unwrap();
    let other = format.parse_str("<catalog><product>Tea</product></catalog>").unwrap();
    let product = other.child_element("product").unwrap();
    let clone = product.clone();

    order.append_child(&product).unwrap();

    assert_eq!(clone, product);
    assert_eq!(clone.text_content(), "Tea");
}

#[test]
fn handles_taken_before_adoption_stay_in_the_source_document() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order/>").unwrap();
    let other = format
        .parse_str("<catalog><product><flavor/></product></catalog>")
        .unwrap();
    let product = other.child_element("product").unwrap();
    let flavor_before = product.child_element("flavor").unwrap();

    order.append_child(&product).unwrap();

    // still readable, but it names the detached original, not the copy
    assert_eq!(flavor_before.name(), "flavor");
    assert_ne!(product.child_element("flavor").unwrap(), flavor_before);
}

#[test]
fn batch_append_is_not_transactional() {
    let format = XmlDataFormat::new();
    let root = format.parse_str("<root><inner/></root>").unwrap();
    let inner = root.child_element("inner").unwrap();
    let fresh = format.parse_str("<fresh/>").unwrap();

    // appending an ancestor fails, but the element before it stays in
    let err = inner.append(&[&fresh, &root]).unwrap_err();
    assert!(matches!(err, Error::AppendFailed));
    assert_eq!(inner.child_element("fresh").unwrap(), fresh);
}

#[test]
fn append_before_and_after_position_relative_to_a_child() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format.parse_str("<order><b/></order>").unwrap();
    let b = order.child_element("b").unwrap();
    let a = format.parse_str("<a/>").unwrap();
    let c = format.parse_str("<c/>").unwrap();

    order.append_before(&a, &b).unwrap();
    order.append_after(&c, &b).unwrap();
    assert_eq!(
        order.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order><a/><b/><c/></order>"
    );
}

#[test]
fn reference_must_be_a_child_for_positional_appends() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order><b><nested/></b></order>").unwrap();
    let b = order.child_element("b").unwrap();
    let nested = b.child_element("nested").unwrap();
    let fresh = format.parse_str("<fresh/>").unwrap();

    assert!(matches!(
        order.append_before(&fresh, &nested),
        Err(Error::NotAChildElement)
    ));
}

#[test]
fn removed_elements_stay_alive_and_can_be_reappended() {
    let format = XmlDataFormat::new();
    let order = format
        .parse_str("<order><product>Milk</product></order>")
        .unwrap();
    let product = order.child_element("product").unwrap();

    order.remove_child(&product).unwrap();
    assert!(order.child_element("product").is_err());
    assert_eq!(product.text_content(), "Milk");

    order.append_child(&product).unwrap();
    assert_eq!(order.child_element("product").unwrap(), product);
}

#[test]
fn removing_a_non_child_fails() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order><b><nested/></b></order>").unwrap();
    let nested = order
        .child_element("b")
        .unwrap()
        .child_element("nested")
        .unwrap();
    let stranger = format.parse_str("<x/>").unwrap();

    // neither a handle from another document nor a grandchild is a child
    assert!(matches!(
        order.remove_child(&stranger),
        Err(Error::NotAChildElement)
    ));
    assert!(matches!(
        order.remove_child(&nested),
        Err(Error::NotAChildElement)
    ));
}

#[test]
fn replace_swaps_an_element_in_its_parent() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format.parse_str("<order><old/></order>").unwrap();
    let old = order.child_element("old").unwrap();
    let new = format.parse_str("<new/>").unwrap();

    let returned = old.replace(&new).unwrap();
    assert_eq!(returned, new);
    assert_eq!(
        order.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order><new/></order>"
    );
}

#[test]
fn replace_on_a_parentless_element_adopts_first_then_fails() {
    let format = XmlDataFormat::new();
    let order = format.parse_str("<order><item/></order>").unwrap();
    let item = order.child_element("item").unwrap();
    order.remove_child(&item).unwrap();

    let other = format.parse_str("<catalog><new/></catalog>").unwrap();
    let new = other.child_element("new").unwrap();

    assert!(matches!(
        item.replace(&new),
        Err(Error::ElementHasNoParent)
    ));
    // the adoption already happened: the source document lost the node
    assert!(other.child_element("new").is_err());
}

#[test]
fn replace_child_checks_childhood_first() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format.parse_str("<order><old/></order>").unwrap();
    let old = order.child_element("old").unwrap();
    let new = format.parse_str("<new/>").unwrap();

    let stranger = format.parse_str("<s/>").unwrap();
    assert!(matches!(
        order.replace_child(&stranger, &new),
        Err(Error::NotAChildElement)
    ));

    order.replace_child(&old, &new).unwrap();
    assert_eq!(
        order.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order><new/></order>"
    );
}

#[test]
fn set_text_content_replaces_all_children() {
    let format = XmlDataFormat::builder().pretty_print(false).build();
    let order = format
        .parse_str("<order><a/>text<b/></order>")
        .unwrap();
    order.set_text_content("done");
    assert_eq!(
        order.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order>done</order>"
    );
    order.set_text_content("");
    assert_eq!(
        order.to_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><order/>"
    );
}

#[test]
fn attribute_writes_and_idempotent_removal() {
    let elem = xylem::parse("<e/>").unwrap();

    elem.set_attr("id", "1").unwrap();
    assert_eq!(elem.attr("id").unwrap().value().unwrap(), "1");
    assert!(elem.has_attr("id"));

    elem.set_attr("id", "2").unwrap();
    assert_eq!(elem.attr("id").unwrap().value().unwrap(), "2");

    elem.remove_attr("id");
    assert!(!elem.has_attr("id"));
    // removing again is fine
    elem.remove_attr("id");

    assert!(matches!(
        elem.attr("id"),
        Err(Error::AttributeNotFound { .. })
    ));
}

#[test]
fn namespaced_attributes_and_reserved_prefixes() {
    let elem = xylem::parse("<e/>").unwrap();

    elem.set_attr_ns(Some("urn:x"), "x:id", "v").unwrap();
    assert!(elem.has_attr_ns(Some("urn:x"), "id"));
    assert!(!elem.has_attr("id"));

    assert!(matches!(
        elem.set_attr_ns(None, "x:id", "v"),
        Err(Error::AttributeSetFailed { .. })
    ));
    assert!(matches!(
        elem.set_attr_ns(Some("urn:x"), "xmlns:y", "v"),
        Err(Error::AttributeSetFailed { .. })
    ));
    assert!(matches!(
        elem.set_attr_ns(Some("urn:x"), "xml:space", "v"),
        Err(Error::AttributeSetFailed { .. })
    ));
    assert!(matches!(
        elem.set_attr("not a name", "v"),
        Err(Error::AttributeSetFailed { .. })
    ));

    // the reserved prefixes work with their own namespaces
    elem.set_attr_ns(Some("http://www.w3.org/XML/1998/namespace"), "xml:space", "preserve")
        .unwrap();
}

#[test]
fn attribute_handles_track_the_live_value() {
    let elem = xylem::parse("<e id=\"1\"/>").unwrap();
    let attr = elem.attr("id").unwrap();
    assert!(attr.has_prefix(None));

    attr.set_value("9").unwrap();
    assert_eq!(elem.attr("id").unwrap().value().unwrap(), "9");
    assert_eq!(attr.to_string(), "9");

    let mut sink = Vec::new();
    attr.write_to(&mut sink).unwrap();
    assert_eq!(sink, b"9");

    let owner = attr.remove();
    assert_eq!(owner, elem);
    assert!(attr.value().is_err());
    assert_eq!(attr.to_string(), "");
    assert!(attr.set_value("x").is_err());
}

#[test]
fn child_element_lookup_defaults_to_the_own_namespace() {
    let format = XmlDataFormat::new();
    let root = format
        .parse_str("<o:order xmlns:o=\"urn:o\"><o:item/><item/></o:order>")
        .unwrap();

    // unqualified lookup inherits urn:o from the order element
    let item = root.child_element("item").unwrap();
    assert_eq!(item.namespace().as_deref(), Some("urn:o"));

    // the null namespace must be asked for explicitly
    let plain = root.child_element_ns(None, "item").unwrap();
    assert_eq!(plain.namespace(), None);
    assert_ne!(item, plain);
}

#[test]
fn child_element_rejects_zero_and_many() {
    let order = xylem::parse("<order><p/><p/></order>").unwrap();
    assert!(matches!(
        order.child_element("missing"),
        Err(Error::ChildElementNotFound { .. })
    ));
    assert!(matches!(
        order.child_element("p"),
        Err(Error::MultipleChildElementsFound { .. })
    ));
    assert_eq!(order.child_elements_ns(None, "p").unwrap().len(), 2);
}

#[test]
fn handle_equality_is_node_identity() {
    let order = xylem::parse("<order><p>same</p><p>same</p></order>").unwrap();
    let ps = order.child_elements_ns(None, "p").unwrap();
    assert_ne!(ps[0], ps[1]);
    assert_eq!(ps[0], order.child_elements().iter().next().unwrap());
}

#[test]
fn attr_names_and_namespace_filtered_iteration() {
    let elem = xylem::parse("<e xmlns:m=\"urn:m\" a=\"1\" m:b=\"2\" c=\"3\"/>").unwrap();
    assert_eq!(elem.attr_names_ns(None), ["a", "c"]);
    assert_eq!(elem.attr_names_ns(Some("urn:m")), ["b"]);
    let all = elem.attr_names();
    assert!(all.contains(&"m".to_string())); // the xmlns:m declaration
    assert_eq!(all.len(), 4);
}
