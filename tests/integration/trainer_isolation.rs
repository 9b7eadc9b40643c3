//! Independent per-site training

use super::test_utils::{all_traces, words};
use choicepoint::model::trainer::group_by_site;
use choicepoint::{GeneratorTrace, ModelError, OpInfo, OpModel, Sid, Trainer, Value};
use serde_json::json;

fn letter_sid() -> Sid {
    Sid::from("words::Select::letter")
}

fn without_len_site(traces: &[GeneratorTrace]) -> Vec<GeneratorTrace> {
    traces
        .iter()
        .map(|t| GeneratorTrace {
            inputs: t.inputs.clone(),
            op_traces: t
                .op_traces
                .iter()
                .filter(|op| op.op_info.uid.as_deref() != Some("len"))
                .cloned()
                .collect(),
        })
        .collect()
}

#[test]
fn test_site_model_ignores_other_sites() {
    let traces = all_traces(&words(), vec!['a', 'b', 'c']);
    let reduced = without_len_site(&traces);

    for kind in ["frequency", "perceptron"] {
        let trainer = Trainer::new(kind).unwrap();
        let full = trainer.train(&traces, &[], 5).unwrap();
        let partial = trainer.train(&reduced, &[], 5).unwrap();
        assert_eq!(full.len(), 2);
        assert_eq!(partial.len(), 1);

        let full_model = full.get(&letter_sid()).unwrap();
        let partial_model = partial.get(&letter_sid()).unwrap();
        assert_eq!(full_model.encode().unwrap(), partial_model.encode().unwrap());
    }
}

#[test]
fn test_validation_grouped_per_site() {
    let traces = all_traces(&words(), vec!['a', 'b']);
    let (_, reports) = Trainer::new("frequency")
        .unwrap()
        .train_with_report(&traces, &traces[..1], 1)
        .unwrap();
    let letter = reports.iter().find(|r| r.sid == letter_sid()).unwrap();
    assert_eq!(letter.validation_examples, 1);
    assert!(letter.report.validation_accuracy.is_some());
    assert_eq!(
        letter.report.examples,
        group_by_site(&traces)[&letter_sid()].examples.len()
    );
}

struct Constant;

impl OpModel for Constant {
    fn kind(&self) -> &str {
        "constant"
    }

    fn infer(&self, domain: &[Value], _context: Option<&Value>) -> Vec<usize> {
        (0..domain.len()).collect()
    }

    fn train(
        &mut self,
        _examples: &[choicepoint::OpExample],
        _validation: &[choicepoint::OpExample],
        _num_epochs: usize,
    ) -> Result<choicepoint::TrainReport, ModelError> {
        Err(ModelError::Encode("cannot train".to_string()))
    }

    fn encode(&self) -> Result<Vec<u8>, ModelError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_factory_can_choose_family_per_site() {
    let trainer = Trainer::with_factory(|info: &OpInfo| -> Result<Box<dyn OpModel>, ModelError> {
        match info.uid.as_deref() {
            Some("len") => Ok(Box::new(choicepoint::model::PerceptronModel::new())),
            _ => Ok(Box::new(choicepoint::model::FrequencyModel::new())),
        }
    });
    let bundle = trainer
        .train(&all_traces(&words(), vec!['a']), &[], 3)
        .unwrap();
    let kinds: Vec<&str> = bundle.iter().map(|(_, site)| site.model.kind()).collect();
    assert_eq!(kinds, vec!["perceptron", "frequency"]);
}

#[test]
fn test_failing_site_reports_its_sid() {
    let trainer = Trainer::with_factory(|_: &OpInfo| -> Result<Box<dyn OpModel>, ModelError> {
        Ok(Box::new(Constant))
    });
    let err = trainer
        .train(&all_traces(&words(), vec!['a']), &[], 1)
        .unwrap_err();
    assert!(matches!(err, ModelError::TrainingFailed { ref sid, .. } if sid == "words::Select::len"));
}

#[test]
fn test_empty_training_set_gives_empty_bundle() {
    let bundle = Trainer::new("frequency").unwrap().train(&[], &[], 3).unwrap();
    assert!(bundle.is_empty());
    assert_eq!(bundle.infer(&letter_sid(), &[json!("a")], None), None);
}
