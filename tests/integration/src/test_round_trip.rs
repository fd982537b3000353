//! Value round trips through each wire format.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use websvc_coder::{Format, RpcCoder};
    use websvc_model::{Struct, Value};

    use crate::{coder, encoded_soap_coder, sample_instant, sample_parameters};

    #[test]
    fn test_should_round_trip_values_through_xmlrpc() {
        let params = sample_parameters();
        for compact in [false, true] {
            let mut coder = coder(Format::XmlRpc, compact);
            let request = coder
                .build_request(Some("store.put"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.method.as_deref(), Some("store.put"));
            assert_eq!(message.parameters, params);
        }
    }

    #[test]
    fn test_should_round_trip_values_through_encoded_soap() {
        let params = sample_parameters();
        for compact in [false, true] {
            let mut coder = encoded_soap_coder(compact);
            let request = coder
                .build_request(Some("put"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.method.as_deref(), Some("put"));
            assert_eq!(message.parameters, params);

            let response = coder
                .build_response(Some("put"), &params, None)
                .expect("response builds");
            let message = coder.parse_message(&response).expect("response parses");
            assert_eq!(message.method.as_deref(), Some("putResponse"));
            assert_eq!(message.parameters, params);
        }
    }

    #[test]
    fn test_should_round_trip_values_through_soap_with_default_settings() {
        let params = sample_parameters();
        for compact in [false, true] {
            let mut coder = coder(Format::Soap, compact);
            let request = coder
                .build_request(Some("put"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.parameters, params);
        }
    }

    #[test]
    fn test_should_round_trip_plain_values_through_json() {
        let params = Struct::ordered([
            ("s", Value::from("line\nbreak")),
            ("i", Value::Int(i64::MIN)),
            ("d", Value::Double(-1.5e-3)),
            ("b", Value::Bool(false)),
            ("n", Value::Null),
        ]);
        for compact in [false, true] {
            let mut coder = coder(Format::Json, compact);
            let request = coder
                .build_request(Some("m"), &params, None)
                .expect("request builds");
            let message = coder.parse_message(&request).expect("request parses");
            assert_eq!(message.parameters, params);
        }
    }

    #[test]
    fn test_should_carry_dates_as_basic_text_and_binary_as_base64_in_json() {
        let params = sample_parameters();
        let mut coder = coder(Format::Json, true);
        let request = coder
            .build_request(Some("m"), &params, None)
            .expect("request builds");
        let message = coder.parse_message(&request).expect("request parses");

        assert_eq!(message.parameter("created"), Some(&Value::DateTime(sample_instant())));
        let encoded = message
            .parameter("payload")
            .and_then(Value::as_str)
            .expect("binary as text");
        assert_eq!(
            coder.coder().decode_base64_from(encoded),
            Some(Bytes::from_static(b"\x00\x01\x02binary\xff"))
        );
        assert_eq!(message.parameter("count"), params.get("count"));
        assert_eq!(message.parameter("owner"), params.get("owner"));
    }

    #[test]
    fn test_should_round_trip_scalar_codecs() {
        let coder = coder(Format::Soap, true);
        let base = coder.coder();
        let data = b"\x00\x7f\x80\xffhex";
        let hex = base.encode_hex_binary_from(data);
        assert_eq!(hex, "007F80FF686578");
        assert_eq!(base.decode_hex_binary_from(&hex.to_lowercase()).as_deref(), Some(&data[..]));
        assert_eq!(base.decode_hex_binary_from("0"), None);
        assert_eq!(base.decode_hex_binary_from("0g"), None);

        let b64 = base.encode_base64_from(data);
        assert_eq!(base.decode_base64_from(&b64).as_deref(), Some(&data[..]));
        assert_eq!(base.decode_base64_from("%%%"), None);
    }

    #[test]
    fn test_should_reject_what_other_formats_wrote() {
        let params = sample_parameters();
        let mut xmlrpc = coder(Format::XmlRpc, true);
        let request = xmlrpc
            .build_request(Some("m"), &params, None)
            .expect("request builds");

        let mut soap = coder(Format::Soap, true);
        assert!(soap.parse_message(&request).is_err());
        let mut json = coder(Format::Json, true);
        assert!(json.parse_message(&request).is_err());
    }
}
