//! A client and a server exchanging XML-RPC documents.

#[cfg(test)]
mod tests {
    use websvc_coder::{CoderError, Format, Struct, Value};

    use crate::coder;

    fn text(doc: &[u8]) -> &str {
        std::str::from_utf8(doc).expect("utf-8 document")
    }

    #[test]
    fn test_should_exchange_add_call() {
        let mut client = coder(Format::XmlRpc, true);
        let mut server = coder(Format::XmlRpc, true);

        let request = client
            .build_request(Some("add"), &Struct::ordered([("a", 1), ("b", 2)]), None)
            .expect("request builds");
        assert_eq!(
            text(&request),
            "<?xml version=\"1.0\"?><methodCall><methodName>add</methodName><params>\
             <param name=\"a\"><value><i4>1</i4></value></param>\
             <param name=\"b\"><value><i4>2</i4></value></param>\
             </params></methodCall>"
        );

        let call = server.parse_message(&request).expect("request parses");
        assert_eq!(call.method.as_deref(), Some("add"));
        assert!(!call.is_fault());
        let sum: i64 = call
            .order
            .iter()
            .filter_map(|name| call.parameter(name).and_then(Value::as_int))
            .sum();

        let response = server
            .build_response(call.method.as_deref(), &Struct::ordered([("sum", sum)]), None)
            .expect("response builds");
        assert_eq!(
            text(&response),
            "<?xml version=\"1.0\"?><methodResponse><params>\
             <param name=\"sum\"><value><i4>3</i4></value></param>\
             </params></methodResponse>"
        );

        let reply = client.parse_message(&response).expect("response parses");
        assert_eq!(reply.method, None);
        assert_eq!(reply.parameter("sum"), Some(&Value::Int(3)));
        assert_eq!(reply.order, ["sum"]);
    }

    #[test]
    fn test_should_exchange_fault() {
        let mut client = coder(Format::XmlRpc, false);
        let mut server = coder(Format::XmlRpc, false);

        let request = client
            .build_request(Some("math.divide"), &Struct::ordered([("n", 1), ("d", 0)]), None)
            .expect("request builds");
        let call = server.parse_message(&request).expect("request parses");
        assert_eq!(call.parameter("d"), Some(&Value::Int(0)));

        let fault = server
            .build_fault_with_parameters(
                &Struct::ordered([
                    ("faultCode", Value::Int(3)),
                    ("faultString", Value::from("division by zero")),
                ]),
                None,
            )
            .expect("fault builds");
        assert!(text(&fault).contains("<fault>"));
        assert!(!server.fault());

        let reply = client.parse_message(&fault).expect("fault parses");
        assert!(reply.is_fault());
        let details = reply.fault.expect("fault details");
        assert_eq!(details.get("faultCode"), Some(&Value::Int(3)));
        assert_eq!(details.get("faultString"), Some(&Value::from("division by zero")));
    }

    #[test]
    fn test_should_decode_unnamed_parameters_positionally() {
        let mut server = coder(Format::XmlRpc, true);
        let doc = b"<?xml version=\"1.0\"?><methodCall><methodName>add</methodName><params>\
                    <param><value><int>1</int></value></param>\
                    <param><value><int>2</int></value></param>\
                    </params></methodCall>";
        let call = server.parse_message(doc).expect("request parses");
        assert_eq!(call.order, ["Arg0", "Arg1"]);
        assert_eq!(call.parameter("Arg1"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_should_reject_bad_method_names() {
        let mut client = coder(Format::XmlRpc, true);
        assert!(matches!(
            client.build_request(Some("add numbers"), &Struct::new(), None),
            Err(CoderError::InvalidMethodName(_))
        ));
        assert!(matches!(
            client.build_request(None, &Struct::new(), None),
            Err(CoderError::MissingMethodName)
        ));
        assert!(client.coder().output().is_empty());
    }
}
