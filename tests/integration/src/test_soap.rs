//! SOAP body shaping, headers and delegate hooks.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use websvc_coder::{
        CoderDelegate, OperationStyle, Port, RpcCoder, SOAP11_ENVELOPE_NS, SoapCoder, SoapHeader,
        SoapUse, Struct, Value,
    };
    use websvc_xml::{ElementTree, XmlOutput};

    use crate::{encoded_soap_coder, sample_parameters};

    fn text(doc: &[u8]) -> &str {
        std::str::from_utf8(doc).expect("utf-8 document")
    }

    fn literal_coder(style: OperationStyle) -> SoapCoder {
        let mut coder = SoapCoder::default();
        coder.set_compact(true);
        coder.set_soap_use(SoapUse::Literal);
        coder.set_operation_style(style);
        coder.set_method_namespace(Some("urn:calc".to_owned()));
        coder
    }

    fn auth_header() -> ElementTree {
        let mut tree = ElementTree::new();
        let header = tree.create_element("Header", Some(SOAP11_ENVELOPE_NS), "soapenv:Header", &[]);
        let token = tree.create_element("Token", Some("urn:auth"), "t:Token", &[]);
        tree.set_namespace(token, "t", "urn:auth");
        tree.add_content(token, "secret");
        tree.add_child(header, token);
        tree.set_root(header);
        tree
    }

    #[test]
    fn test_should_shape_body_per_style_and_decode_same_parameters() {
        let params = Struct::ordered([("a", "1"), ("b", "2")]);
        let mut bodies = Vec::new();
        for style in [OperationStyle::Rpc, OperationStyle::Document, OperationStyle::Wrapped] {
            let mut coder = literal_coder(style);
            let doc = coder
                .build_request(Some("add"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&doc).expect("request parses");
            assert_eq!(message.parameters, params, "{style:?}");
            assert_eq!(message.order, ["a", "b"], "{style:?}");
            bodies.push(text(&doc).to_owned());
        }

        assert!(bodies[0].contains(
            "<m:add xmlns=\"urn:calc\" xmlns:m=\"urn:calc\"><a>1</a><b>2</b></m:add>"
        ));
        assert!(bodies[1].contains("<soapenv:Body xmlns=\"urn:calc\"><a>1</a><b>2</b></soapenv:Body>"));
        assert!(bodies[2].contains("<add xmlns=\"urn:calc\"><a>1</a><b>2</b></add>"));
        assert_ne!(bodies[0], bodies[1]);
        assert_ne!(bodies[1], bodies[2]);
    }

    #[test]
    fn test_should_name_rpc_responses_after_method() {
        let mut coder = literal_coder(OperationStyle::Rpc);
        let doc = coder
            .build_response(Some("add"), &Struct::ordered([("sum", "3")]), None)
            .expect("response builds");
        let message = coder.parse_message(&doc).expect("response parses");
        assert_eq!(message.method.as_deref(), Some("addResponse"));
        assert_eq!(message.parameter("sum"), Some(&Value::from("3")));
    }

    #[test]
    fn test_should_round_trip_encoded_sample() {
        for compact in [false, true] {
            let mut coder = encoded_soap_coder(compact);
            let params = sample_parameters();
            let doc = coder
                .build_request(Some("store"), &params, None)
                .expect("request builds");
            let body = text(&doc);
            assert!(body.contains("xsi:type=\"soapenc:Array\""));
            assert!(body.contains("soapenc:arrayType=\"xsd:string[3]\""));
            assert!(body.contains("<count xsi:type=\"xsd:int\">42</count>"));

            let message = coder.parse_message(&doc).expect("request parses");
            assert_eq!(message.parameters, params);
        }
    }

    #[test]
    fn test_should_emit_literal_override_verbatim() {
        let raw = "<raw a=\"1\">unescaped & kept</raw>";
        let mut tree = ElementTree::new();
        let el = tree.create("ignored");
        tree.add_content(el, "never written");
        let child = tree.create("child");
        tree.add_child(el, child);
        tree.set_literal_value(el, raw);

        for compact in [false, true] {
            let mut out = XmlOutput::new(compact);
            tree.encode_with(el, &mut out);
            assert_eq!(out.as_str(), raw);
        }

        let mut header = auth_header();
        let root = header.root().expect("header root");
        let token = header.first_child(root).expect("token");
        header.set_literal_value(token, "<t:Token xmlns:t=\"urn:auth\">verbatim</t:Token>");
        let mut coder = literal_coder(OperationStyle::Rpc);
        coder.set_header(SoapHeader::Element(header));
        let doc = coder
            .build_request(Some("ping"), &Struct::new(), None)
            .expect("request builds");
        assert!(text(&doc).contains(
            "<soapenv:Header><t:Token xmlns:t=\"urn:auth\">verbatim</t:Token></soapenv:Header>"
        ));
    }

    #[test]
    fn test_should_return_header_as_independent_tree() {
        let mut coder = literal_coder(OperationStyle::Rpc);
        coder.set_header(SoapHeader::Element(auth_header()));
        let doc = coder
            .build_request(Some("ping"), &Struct::new(), None)
            .expect("request builds");

        let mut message = coder.parse_message(&doc).expect("request parses");
        let header = message.header.as_mut().expect("decoded header");
        let root = header.root().expect("header root");
        assert_eq!(header.name(root), "Header");
        assert_eq!(header.parent(root), None);
        let token = header.find_child(root, "Token").expect("token");
        assert_eq!(header.content(token), Some("secret"));
        assert_eq!(header.namespace(token), Some("urn:auth"));

        header.add_content(token, "-changed");
        let again = coder.parse_message(&doc).expect("request parses");
        let header = again.header.expect("decoded header");
        let root = header.root().expect("header root");
        let token = header.find_child(root, "Token").expect("token");
        assert_eq!(header.content(token), Some("secret"));

        let SoapHeader::Element(original) = coder.header() else {
            panic!("coder header replaced");
        };
        let root = original.root().expect("header root");
        let token = original.find_child(root, "Token").expect("token");
        assert_eq!(original.content(token), Some("secret"));
    }

    #[test]
    fn test_should_write_empty_header_on_request() {
        let mut coder = literal_coder(OperationStyle::Rpc);
        coder.set_header(SoapHeader::Empty);
        let doc = coder
            .build_request(Some("ping"), &Struct::new(), None)
            .expect("request builds");
        assert!(text(&doc).contains("<soapenv:Header />"));
        let message = coder.parse_message(&doc).expect("request parses");
        assert!(message.header.is_some());
    }

    #[derive(Debug)]
    struct Operation {
        port: Port,
    }

    impl CoderDelegate for Operation {
        fn operation_name(&self) -> Option<String> {
            Some("getQuote".to_owned())
        }

        fn operation_port(&self) -> Option<Port> {
            Some(self.port.clone())
        }
    }

    #[test]
    fn test_should_take_operation_from_delegate() {
        let mut coder = SoapCoder::default();
        coder.set_compact(true);
        coder.set_soap_use(SoapUse::Literal);
        let delegate: Arc<dyn CoderDelegate> = Arc::new(Operation {
            port: Port::new("QuotePort").with_target_namespace("urn:quotes"),
        });
        coder.set_delegate(Some(delegate));

        let doc = coder
            .build_request(None, &Struct::ordered([("symbol", "ACME")]), None)
            .expect("request builds");
        assert!(text(&doc).contains(
            "<m:getQuote xmlns=\"urn:quotes\" xmlns:m=\"urn:quotes\"><symbol>ACME</symbol></m:getQuote>"
        ));

        coder.set_method_namespace(Some("urn:override".to_owned()));
        let doc = coder
            .build_request(None, &Struct::new(), None)
            .expect("request builds");
        assert!(text(&doc).contains("xmlns:m=\"urn:override\""));

        let message = coder.parse_message(&doc).expect("request parses");
        assert_eq!(message.method.as_deref(), Some("getQuote"));
    }

    #[test]
    fn test_should_decode_literal_use_as_strings() {
        let mut writer = encoded_soap_coder(true);
        let doc = writer
            .build_request(Some("m"), &Struct::ordered([("n", 5)]), None)
            .expect("request builds");

        let mut typed = SoapCoder::default();
        let message = typed.parse_message(&doc).expect("request parses");
        assert_eq!(message.parameter("n"), Some(&Value::Int(5)));

        writer.set_soap_use(SoapUse::Literal);
        let doc = writer
            .build_request(Some("m"), &Struct::ordered([("n", 5)]), None)
            .expect("request builds");
        let message = typed.parse_message(&doc).expect("request parses");
        assert_eq!(message.parameter("n"), Some(&Value::from("5")));
    }
}
