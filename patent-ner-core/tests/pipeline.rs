use std::collections::HashSet;
use std::fs;
use std::sync::mpsc;

use patent_ner_core::dataset::Corpus;
use patent_ner_core::{DatasetPipeline, PipelineConfig, PipelineEvent};

const VOCABULARY: &str = "term\tcount\nheat exchanger\t12\nsensor\t30\nvalve\t8\n";

fn patent_text() -> String {
    let mut text = String::new();
    for i in 0..40 {
        text.push_str(&format!(
            "In embodiment {i} a heat exchanger transfers thermal energy to the cabin air. \
             A temperature sensor of engine coolant reports the value {i} to the controller.\n"
        ));
        text.push_str("FIG. 3 shows ____________ in a sectional view\n");
    }
    text.push_str("\n\n\nA second patent describes a relief valve assembly for the pump housing.");
    text
}

#[test]
fn test_end_to_end_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let in_file = dir.path().join("patents.en.txt");
    let vocabulary = dir.path().join("matching_list.csv");
    fs::write(&in_file, patent_text()).unwrap();
    fs::write(&vocabulary, VOCABULARY).unwrap();

    let config = PipelineConfig {
        in_file,
        out_dir: dir.path().to_path_buf(),
        matching_list: vocabulary,
        eval_size: 0.2,
        n_process: 2,
        batch_size: 8,
        save_records: true,
        seed: Some(11),
        ..Default::default()
    };
    let (tx, rx) = mpsc::channel();
    let summary = DatasetPipeline::heuristic(config).unwrap().run(tx).unwrap();

    // 40 × 2 sentenças com termos + a da válvula; as linhas com placeholder somem
    assert_eq!(summary.candidates, 81);
    assert_eq!(summary.records, 81);
    assert_eq!(summary.eval, 16);
    assert_eq!(summary.train, 65);
    assert_eq!(summary.training_path, dir.path().join("patents_training.json"));
    assert_eq!(summary.eval_path, dir.path().join("patents_eval.json"));
    assert!(summary.records_path.as_ref().unwrap().exists());

    let events: Vec<PipelineEvent> = rx.try_iter().collect();
    assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));

    let train: Corpus =
        serde_json::from_str(&fs::read_to_string(&summary.training_path).unwrap()).unwrap();
    let eval: Corpus =
        serde_json::from_str(&fs::read_to_string(&summary.eval_path).unwrap()).unwrap();
    assert_eq!(train.len(), 65);
    assert_eq!(eval.len(), 16);

    let train_texts: HashSet<&str> = train.documents.iter().map(|d| d.text.as_str()).collect();
    let eval_texts: HashSet<&str> = eval.documents.iter().map(|d| d.text.as_str()).collect();
    assert!(train_texts.is_disjoint(&eval_texts));
    assert_eq!(train_texts.len() + eval_texts.len(), 81);

    let mut found = HashSet::new();
    for doc in train.documents.iter().chain(&eval.documents) {
        assert!(!doc.text.contains("____"));
        assert!(doc.text.chars().count() > 25);
        assert_eq!(doc.tags.len(), doc.tokens.len());
        for pair in doc.entities.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for e in &doc.entities {
            assert_eq!(e.label, "TERM");
            assert_eq!(&doc.text[e.start..e.end], e.text);
            found.insert(e.text.clone());
        }
    }
    assert!(found.contains("heat exchanger"));
    assert!(found.contains("temperature sensor of engine coolant"));
    assert!(found.contains("relief valve assembly"));
}

#[test]
fn test_missing_vocabulary_stops_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let in_file = dir.path().join("patents.txt");
    fs::write(&in_file, patent_text()).unwrap();

    let config = PipelineConfig {
        in_file,
        out_dir: dir.path().to_path_buf(),
        matching_list: dir.path().join("missing.csv"),
        ..Default::default()
    };
    let (tx, _rx) = mpsc::channel();
    assert!(DatasetPipeline::heuristic(config).unwrap().run(tx).is_err());
    assert!(!dir.path().join("patents_training.json").exists());
}
