mod tests {
    use crate::*;
    use serde_json::json;

    const MUNICH: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const MUNICH_NO_FIX: &str = "$GPGGA,123519,4807.038,N,01131.000,E,0,00,,,,,,,*66";
    const DUBLIN: &str =
        "$GNGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*68";

    fn decoder() -> Decoder {
        Decoder::new(ChecksumPolicy::Ignore, BLE_SOURCE)
    }

    fn strict() -> Decoder {
        Decoder::new(ChecksumPolicy::Verify, BLE_SOURCE)
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "{} is not within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_gpgga_fix() {
        let fix = decoder().decode_sentence(MUNICH.as_bytes()).unwrap();

        assert_close(fix.latitude, 48.0 + 7.038 / 60.0, 1e-5);
        assert_close(fix.longitude, 11.0 + 31.0 / 60.0, 1e-5);
        assert_close(fix.latitude, 48.1173, 1e-4);
        assert_close(fix.longitude, 11.5167, 1e-4);
        assert_eq!(fix.altitude, 545.4);
        assert_eq!(fix.accuracy, 0.9);
        assert!(fix.valid);
        assert_eq!(fix.source, "ble_gps");
    }

    #[test]
    fn test_gngga_west() {
        let fix = decoder().decode_sentence(DUBLIN.as_bytes()).unwrap();

        assert_close(fix.latitude, 53.0 + 21.6802 / 60.0, 1e-5);
        assert_close(fix.longitude, -(6.0 + 30.3372 / 60.0), 1e-5);
        assert_eq!(fix.altitude, 61.7);
        assert_eq!(fix.accuracy, 1.03);
    }

    #[test]
    fn test_southern_hemisphere() {
        let sentence = "$GPGGA,010203,3351.600,S,15112.600,E,2,07,1.2,12.0,M,,M,,";
        let fix = decoder().decode_sentence(sentence.as_bytes()).unwrap();

        assert_close(fix.latitude, -(33.0 + 51.6 / 60.0), 1e-5);
        assert_close(fix.longitude, 151.0 + 12.6 / 60.0, 1e-5);
    }

    #[test]
    fn test_no_fix() {
        assert_eq!(
            decoder().decode_sentence(MUNICH_NO_FIX.as_bytes()),
            Err(DecodeError::NoFix)
        );
        assert!(!DecodeError::NoFix.is_parse_error());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            decoder().decode_sentence(b"$GPGGA,bad,data"),
            Err(DecodeError::TooFewFields(3))
        );

        let bad_latitude = "$GPGGA,123519,48x7.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(bad_latitude.as_bytes()),
            Err(DecodeError::InvalidField(2))
        );

        let bad_quality = "$GPGGA,123519,4807.038,N,01131.000,E,x,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(bad_quality.as_bytes()),
            Err(DecodeError::InvalidField(6))
        );

        let bad_altitude = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,5x5.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(bad_altitude.as_bytes()),
            Err(DecodeError::InvalidField(9))
        );

        let bad_hdop = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,-1.0,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(bad_hdop.as_bytes()),
            Err(DecodeError::InvalidField(8))
        );

        assert!(DecodeError::TooFewFields(3).is_parse_error());
    }

    #[test]
    fn test_out_of_range() {
        let hemisphere = "$GPGGA,123519,4807.038,X,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(hemisphere.as_bytes()),
            Err(DecodeError::InvalidField(3))
        );

        let minutes = "$GPGGA,123519,4875.000,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(minutes.as_bytes()),
            Err(DecodeError::InvalidField(2))
        );

        let longitude = "$GPGGA,123519,4807.038,N,18131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(longitude.as_bytes()),
            Err(DecodeError::InvalidField(4))
        );

        let nan = "$GPGGA,123519,NaN,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(nan.as_bytes()),
            Err(DecodeError::InvalidField(2))
        );
    }

    #[test]
    fn test_other_sentences_ignored() {
        let rmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        assert_eq!(
            decoder().decode_sentence(rmc.as_bytes()),
            Err(DecodeError::Unsupported)
        );

        // tag must be the whole first field
        let longer_tag = "$GPGGAX,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            decoder().decode_sentence(longer_tag.as_bytes()),
            Err(DecodeError::Unsupported)
        );
    }

    #[test]
    fn test_too_long() {
        let mut sentence = std::string::String::from(MUNICH);
        while sentence.len() <= MAX_SENTENCE_LEN {
            sentence.push(',');
        }
        assert_eq!(
            decoder().decode_sentence(sentence.as_bytes()),
            Err(DecodeError::TooLong(sentence.len()))
        );
    }

    #[test]
    fn test_not_text() {
        assert_eq!(
            decoder().decode_sentence(&[b'$', 0xff, 0xfe, b',']),
            Err(DecodeError::NotUtf8)
        );
    }

    #[test]
    fn test_payload_with_several_sentences() {
        let payload = concat!(
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
            "\r\n",
            "$GPGGA,123519,4807.038,N,01131.000,E,0,00,,,,,,,*66\r\n",
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\n",
            "$GNGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*68",
        );

        let results: std::vec::Vec<_> = decoder().decode(payload.as_bytes()).collect();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0], Err(DecodeError::Unsupported));
        assert_eq!(results[1], Err(DecodeError::NoFix));
        assert_eq!(results[2].unwrap().altitude, 545.4);
        assert_eq!(results[3].unwrap().altitude, 61.7);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(decoder().decode(b"").count(), 0);
        assert_eq!(decoder().decode(b"\r\n\r\n").count(), 0);
    }

    #[test]
    fn test_checksum() {
        assert_eq!(
            checksum("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            0x47
        );

        assert!(strict().decode_sentence(MUNICH.as_bytes()).is_ok());
        assert!(strict().decode_sentence(DUBLIN.as_bytes()).is_ok());

        let corrupted = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48";
        assert_eq!(
            strict().decode_sentence(corrupted.as_bytes()),
            Err(DecodeError::BadChecksum)
        );
        // relaxed decoding does not look at it
        assert!(decoder().decode_sentence(corrupted.as_bytes()).is_ok());

        let missing = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
        assert_eq!(
            strict().decode_sentence(missing.as_bytes()),
            Err(DecodeError::BadChecksum)
        );
    }

    #[test]
    fn test_ddmm_conversion() {
        assert_close(ddmm_to_decimal(4807.038), 48.1173, 1e-5);
        assert_close(ddmm_to_decimal(1131.0), 11.0 + 31.0 / 60.0, 1e-9);
        assert_close(ddmm_to_decimal(0.0), 0.0, 1e-12);
        assert_close(ddmm_to_decimal(9000.0), 90.0, 1e-12);
    }

    #[test]
    fn test_format_round_trip() {
        let places = [
            (48.1173, 11.516667),
            (-33.86, 151.21),
            (53.361336, -6.50562),
            (-54.8019, -68.303),
            (0.0, 0.0),
            (89.99999, 179.99999),
            (12.999999, -0.000001),
        ];

        for (latitude, longitude) in places {
            let fix = GeoFix {
                latitude,
                longitude,
                altitude: 12.5,
                accuracy: 1.5,
                valid: true,
                source: BLE_SOURCE,
            };
            let sentence = format_gga(&fix, 1).unwrap();
            let decoded = strict().decode_sentence(sentence.as_bytes()).unwrap();

            assert_close(decoded.latitude, latitude, 1e-4);
            assert_close(decoded.longitude, longitude, 1e-4);
            assert_eq!(decoded.altitude, 12.5);
            assert_eq!(decoded.accuracy, 1.5);
        }
    }

    #[test]
    fn test_format_no_fix() {
        let sentence = format_gga(&GeoFix::default(), 0).unwrap();
        assert!(sentence.starts_with("$GPGGA,,0000.00000,N,00000.00000,E,0,"));
        assert_eq!(
            strict().decode_sentence(sentence.as_bytes()),
            Err(DecodeError::NoFix)
        );
    }

    #[test]
    fn test_serialize() {
        let fix = decoder().decode_sentence(MUNICH.as_bytes()).unwrap();
        let value = serde_json::to_value(fix).unwrap();

        assert_eq!(value["deviceId"], json!("ble_gps"));
        assert_eq!(value["valid"], json!(true));
        assert_eq!(value["altitude"].as_f64().unwrap() as f32, 545.4);
        assert!(value.get("latitude").is_some());
        assert!(value.get("longitude").is_some());
        assert!(value.get("accuracy").is_some());
        assert!(value.get("source").is_none());
    }

    #[test]
    fn test_blank_hdop_and_altitude() {
        let blank = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,,,M,,M,,";
        let fix = decoder().decode_sentence(blank.as_bytes()).unwrap();

        assert!(fix.valid);
        assert_close(fix.latitude, 48.1173, 1e-4);
        assert_close(fix.longitude, 11.5167, 1e-4);
        assert_eq!(fix.accuracy, 0.0);
        assert_eq!(fix.altitude, 0.0);
    }
}
