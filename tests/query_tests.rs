//! XPath query surface: the seven typed accessors, root rejection, and
//! evaluation-time namespace resolution.

use xylem::{Error, XmlDataFormat};

const ORDER: &str = "<order id=\"o1\"><product id=\"p1\">Milk</product><product id=\"p2\">Coffee</product></order>";

#[test]
fn element_returns_the_first_match_in_document_order() {
    let order = xylem::parse(ORDER).unwrap();
    let product = order.xpath("/order/product").element().unwrap();
    assert_eq!(product.text_content(), "Milk");
    let second = order.xpath("/order/product[2]").element().unwrap();
    assert_eq!(second.text_content(), "Coffee");
}

#[test]
fn element_list_returns_every_match_and_rejects_emptiness() {
    let order = xylem::parse(ORDER).unwrap();
    let products = order.xpath("//product").element_list().unwrap();
    assert_eq!(products.len(), 2);

    assert!(matches!(
        order.xpath("//nothing").element_list(),
        Err(Error::ElementNotFound(_))
    ));
}

#[test]
fn attribute_accessors() {
    let order = xylem::parse(ORDER).unwrap();
    let id = order.xpath("/order/product/@id").attribute().unwrap();
    assert_eq!(id.name(), "id");
    assert_eq!(id.value().unwrap(), "p1");

    let ids = order.xpath("//@id").attribute_list().unwrap();
    assert_eq!(ids.len(), 3);

    // a query-produced attribute handle writes through to the tree
    id.set_value("changed").unwrap();
    assert_eq!(
        order.xpath("/order/product[1]/@id").string().unwrap(),
        "changed"
    );

    assert!(matches!(
        order.xpath("//@missing").attribute(),
        Err(Error::ElementNotFound(_))
    ));
}

#[test]
fn positional_predicates_select_per_group() {
    let root = xylem::parse(
        "<r><g><p>a</p><p>b</p></g><g><p>c</p><p>d</p></g></r>",
    )
    .unwrap();

    // one match per g, not one match overall
    let firsts = root.xpath("/r/g/p[1]").element_list().unwrap();
    let texts: Vec<String> = firsts.iter().map(|e| e.text_content()).collect();
    assert_eq!(texts, ["a", "c"]);

    let lasts = root.xpath("/r/g/p[last()]").element_list().unwrap();
    let texts: Vec<String> = lasts.iter().map(|e| e.text_content()).collect();
    assert_eq!(texts, ["b", "d"]);
}

#[test]
fn shape_mismatches_are_rejected() {
    let order = xylem::parse(ORDER).unwrap();
    assert!(matches!(
        order.xpath("/order/product/@id").element(),
        Err(Error::PathResultTypeMismatch { .. })
    ));
    assert!(matches!(
        order.xpath("/order/product").attribute(),
        Err(Error::PathResultTypeMismatch { .. })
    ));
    assert!(matches!(
        order.xpath("count(//product)").element(),
        Err(Error::PathResultTypeMismatch { .. })
    ));
}

#[test]
fn root_expression_is_rejected_by_all_seven_accessors() {
    let order = xylem::parse(ORDER).unwrap();
    let is_rejected = |e: Error| matches!(e, Error::ElementQueryRootRejected);

    assert!(order.xpath("/").element().is_err_and(is_rejected));
    assert!(order.xpath("/").element_list().is_err_and(is_rejected));
    assert!(order.xpath("/").attribute().is_err_and(is_rejected));
    assert!(order.xpath("/").attribute_list().is_err_and(is_rejected));
    assert!(order.xpath("/").string().is_err_and(is_rejected));
    assert!(order.xpath("/").number().is_err_and(is_rejected));
    assert!(order.xpath("/").bool().is_err_and(is_rejected));
}

#[test]
fn scalar_coercions() {
    let order = xylem::parse(ORDER).unwrap();
    assert_eq!(order.xpath("string(/order/product)").string().unwrap(), "Milk");
    assert_eq!(order.xpath("/order/missing").string().unwrap(), "");
    assert_eq!(order.xpath("count(//product)").number().unwrap(), 2.0);
    assert!(order.xpath("/order/missing").number().unwrap().is_nan());
    assert!(order.xpath("//product").bool().unwrap());
    assert!(!order.xpath("//missing").bool().unwrap());
    assert!(order.xpath("/order/product = 'Coffee'").bool().unwrap());
}

#[test]
fn parse_and_evaluation_failures_carry_the_expression() {
    let order = xylem::parse(ORDER).unwrap();
    match order.xpath("///").string() {
        Err(Error::PathEvaluationFailed { expression, .. }) => assert_eq!(expression, "///"),
        other => panic!("expected PathEvaluationFailed, got {other:?}"),
    }
    assert!(matches!(
        order.xpath("/unknown:order").element(),
        Err(Error::PathEvaluationFailed { .. })
    ));
}

#[test]
fn prefix_bindings_take_effect_per_evaluation() {
    let root = xylem::parse(
        "<root><item xmlns=\"urn:a\">A</item><item xmlns=\"urn:b\">B</item></root>",
    )
    .unwrap();
    let query = root.xpath("/root/p:item");

    query.ns("p", "urn:a");
    assert_eq!(query.element().unwrap().text_content(), "A");

    // rebinding the same prefix redirects the next evaluation
    query.ns("p", "urn:b");
    assert_eq!(query.element().unwrap().text_content(), "B");
}

#[test]
fn ns_all_binds_a_whole_map() {
    let root = xylem::parse(
        "<root><x xmlns=\"urn:a\"><y xmlns=\"urn:b\">deep</y></x></root>",
    )
    .unwrap();
    let query = root.xpath("/root/a:x/b:y");
    query.ns_all([("a", "urn:a"), ("b", "urn:b")]);
    assert_eq!(query.string().unwrap(), "deep");
}

#[test]
fn in_scope_declarations_resolve_without_explicit_bindings() {
    let root = xylem::parse("<r xmlns:v=\"urn:v\"><v:x>1</v:x></r>").unwrap();
    assert_eq!(root.xpath("/r/v:x").string().unwrap(), "1");

    // explicit bindings shadow the document's declaration
    let query = root.xpath("/r/v:x");
    query.ns("v", "urn:other");
    assert!(matches!(query.element(), Err(Error::ElementNotFound(_))));
}

#[test]
fn unprefixed_name_tests_match_the_null_namespace_only() {
    let root = xylem::parse(
        "<root><item xmlns=\"urn:a\"/><item/></root>",
    )
    .unwrap();
    let items = root.xpath("/root/item").element_list().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].namespace(), None);
}

#[test]
fn queries_observe_mutations_made_between_evaluations() {
    let format = XmlDataFormat::new();
    let order = format.parse_str(ORDER).unwrap();
    let count = order.xpath("count(/order/product)");
    assert_eq!(count.number().unwrap(), 2.0);

    let extra = format.parse_str("<product>Tea</product>").unwrap();
    order.append_child(&extra).unwrap();
    assert_eq!(count.number().unwrap(), 3.0);
}

#[test]
fn relative_queries_start_at_the_element() {
    let order = xylem::parse(ORDER).unwrap();
    let second = order.xpath("product[2]").element().unwrap();
    assert_eq!(second.text_content(), "Coffee");
    let found = second.xpath("..").element().unwrap();
    assert_eq!(found, order);
}
