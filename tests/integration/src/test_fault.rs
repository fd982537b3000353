//! Fault building and the scoping of the fault flag.

#[cfg(test)]
mod tests {
    use websvc_coder::{CoderError, Format};
    use websvc_model::{Struct, Value};

    use crate::coder;

    const FORMATS: [Format; 3] = [Format::XmlRpc, Format::Json, Format::Soap];

    fn fault_details() -> Struct {
        Struct::ordered([
            ("faultCode", Value::Int(-32000)),
            ("faultString", Value::from("server exploded")),
        ])
    }

    #[test]
    fn test_should_scope_fault_flag_to_fault_build() {
        for format in FORMATS {
            let mut coder = coder(format, true);
            assert!(!coder.fault());
            coder
                .build_fault_with_parameters(&fault_details(), None)
                .expect("fault builds");
            assert!(!coder.fault(), "{format}");

            let request = coder
                .build_request(Some("after"), &Struct::ordered([("x", 1)]), None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert!(!message.is_fault(), "{format} built a fault after the fault call");
        }
    }

    #[test]
    fn test_should_keep_fault_flag_set_by_caller() {
        for format in FORMATS {
            let mut coder = coder(format, true);
            coder.set_fault(true);
            coder
                .build_fault_with_parameters(&fault_details(), None)
                .expect("fault builds");
            assert!(coder.fault(), "{format}");

            coder.reset();
            assert!(!coder.fault(), "{format}");
        }
    }

    #[test]
    fn test_should_restore_fault_flag_when_fault_build_fails() {
        let bad_order = vec!["nope".to_owned()];
        for format in FORMATS {
            let mut coder = coder(format, true);
            let result = coder.build_fault_with_parameters(&fault_details(), Some(bad_order.as_slice()));
            assert!(matches!(result, Err(CoderError::OrderMismatch(_))), "{format}");
            assert!(!coder.fault(), "{format}");
        }
    }

    #[test]
    fn test_should_decode_fault_details() {
        for format in FORMATS {
            let mut coder = coder(format, true);
            let fault = coder
                .build_fault_with_parameters(&fault_details(), None)
                .expect("fault builds");
            let message = coder.parse_message(&fault).expect("fault parses");
            assert!(message.is_fault(), "{format}");
            assert!(message.parameters.is_empty(), "{format}");

            let details = message.fault.expect("fault details");
            assert_eq!(
                details.order().expect("decoded order"),
                ["faultCode", "faultString"],
                "{format}"
            );
            assert_eq!(
                details.get("faultString"),
                Some(&Value::from("server exploded")),
                "{format}"
            );
        }
    }

    #[test]
    fn test_should_build_fault_when_flag_is_set() {
        for format in FORMATS {
            let mut coder = coder(format, true);
            coder.set_fault(true);
            let doc = coder
                .build_request(None, &fault_details(), None)
                .expect("fault builds without a method");
            let message = coder.parse_message(&doc).expect("fault parses");
            assert!(message.is_fault(), "{format}");
        }
    }
}
