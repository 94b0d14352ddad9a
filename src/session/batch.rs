use serde::Deserialize;

/// Inbound stream frame: `{"channels": [[..], ..]}` or a bare `[[..], ..]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboundBatch {
    Tagged { channels: Vec<Vec<f64>> },
    Bare(Vec<Vec<f64>>),
}

/// First non-empty channel vector of a raw frame, or `None` if the frame is
/// malformed, lacks `channels`, or its first vector is empty.
pub fn first_channel_vector(raw: &str) -> Option<Vec<f64>> {
    let batch: InboundBatch = serde_json::from_str(raw).ok()?;
    let rows = match batch {
        InboundBatch::Tagged { channels } => channels,
        InboundBatch::Bare(rows) => rows,
    };
    rows.into_iter().next().filter(|row| !row.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_batch_takes_first_row() {
        let row = first_channel_vector(r#"{"channels":[[1,2,3],[4,5,6]]}"#).unwrap();
        assert_eq!(row, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bare_batch_accepted() {
        let row = first_channel_vector("[[0.5,-0.25],[9,9]]").unwrap();
        assert_eq!(row, vec![0.5, -0.25]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let row = first_channel_vector(r#"{"fs":256,"channels":[[7]]}"#).unwrap();
        assert_eq!(row, vec![7.0]);
    }

    #[test]
    fn test_malformed_frames_rejected() {
        for raw in [
            "",
            "not json",
            r#"{"data":[[1,2]]}"#,
            r#"{"channels":null}"#,
            r#"{"channels":[]}"#,
            r#"{"channels":[[]]}"#,
            r#"{"channels":[["a"]]}"#,
            "[1,2,3]",
        ] {
            assert!(first_channel_vector(raw).is_none(), "accepted {:?}", raw);
        }
    }
}
