//! Parameter order: explicit orders, local orders and conflicts between them.

#[cfg(test)]
mod tests {
    use websvc_coder::{CoderError, Format};
    use websvc_model::{Struct, Value};

    use crate::{coder, names};

    const FORMATS: [Format; 3] = [Format::XmlRpc, Format::Json, Format::Soap];

    fn unordered() -> Struct {
        let mut params = Struct::new();
        params.insert("a", 1);
        params.insert("b", 2);
        params
    }

    #[test]
    fn test_should_follow_explicit_order() {
        let order = names(&["b", "a"]);
        for format in FORMATS {
            let mut coder = coder(format, true);
            let request = coder
                .build_request(Some("m"), &unordered(), Some(order.as_slice()))
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.order, order, "{format}");
            assert_eq!(
                message.parameters.order().expect("decoded order"),
                order.as_slice(),
                "{format}"
            );
        }
    }

    #[test]
    fn test_should_sort_keys_without_any_order() {
        let mut params = Struct::new();
        for key in ["delta", "alpha", "charlie", "bravo"] {
            params.insert(key, Value::from(key));
        }
        for format in FORMATS {
            let mut coder = coder(format, true);
            let request = coder
                .build_request(Some("m"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.order, ["alpha", "bravo", "charlie", "delta"], "{format}");
        }
    }

    #[test]
    fn test_should_prefer_explicit_order_over_local_order() {
        let params = Struct::ordered([("x", 1), ("y", 2), ("z", 3)]);
        let order = names(&["z", "x", "y"]);
        for format in FORMATS {
            let mut coder = coder(format, true);
            let request = coder
                .build_request(Some("m"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.order, ["x", "y", "z"], "{format}");

            let request = coder
                .build_request(Some("m"), &params, Some(order.as_slice()))
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.order, order, "{format}");
        }
    }

    #[test]
    fn test_should_keep_local_order_of_nested_structures() {
        let inner = Struct::ordered([("second", 2), ("first", 1)]);
        let params = Struct::ordered([("inner", Value::Struct(inner)), ("outer", Value::Int(0))]);
        let order = names(&["outer", "inner"]);
        for format in FORMATS {
            let mut coder = coder(format, true);
            let request = coder
                .build_request(Some("m"), &params, Some(order.as_slice()))
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.order, order, "{format}");
            let inner = message
                .parameter("inner")
                .and_then(Value::as_struct)
                .expect("nested structure");
            assert_eq!(inner.order().expect("decoded order"), ["second", "first"], "{format}");
        }
    }

    #[test]
    fn test_should_fail_when_order_does_not_match_keys() {
        let params = unordered();
        let cases = [names(&["a"]), names(&["a", "b", "c"]), names(&["a", "a", "b"])];
        for format in FORMATS {
            let mut coder = coder(format, true);
            for order in &cases {
                let result = coder.build_request(Some("m"), &params, Some(order.as_slice()));
                assert!(
                    matches!(result, Err(CoderError::OrderMismatch(_))),
                    "{format} accepted order {order:?}"
                );
                assert!(coder.coder().output().is_empty(), "{format} left partial output");
            }
        }
    }

    #[test]
    fn test_should_fail_when_nested_local_order_is_wrong() {
        let mut inner = Struct::ordered([("a", 1)]);
        inner.set_order(Some(names(&["a", "missing"])));
        let params = Struct::ordered([("inner", Value::Struct(inner))]);
        for format in FORMATS {
            let mut coder = coder(format, true);
            assert!(
                matches!(
                    coder.build_request(Some("m"), &params, None),
                    Err(CoderError::OrderMismatch(_))
                ),
                "{format}"
            );
        }
    }
}
