use crate::core::training::LearningRateSchedule;
use approx::assert_relative_eq;

#[test]
fn 다단계_감소_테스트() {
    let schedule = LearningRateSchedule::multi_step(vec![3, 10, 20, 50, 100], 0.5);
    let base = 0.001;

    assert_relative_eq!(schedule.learning_rate(base, 0), 0.001);
    assert_relative_eq!(schedule.learning_rate(base, 2), 0.001);
    // 마일스톤 에포크부터 감소
    assert_relative_eq!(schedule.learning_rate(base, 3), 0.0005);
    assert_relative_eq!(schedule.learning_rate(base, 9), 0.0005);
    assert_relative_eq!(schedule.learning_rate(base, 10), 0.00025);
    assert_relative_eq!(schedule.learning_rate(base, 150), 0.001 / 32.0);
}

#[test]
fn 고정_학습률_테스트() {
    let schedule = LearningRateSchedule::Constant;
    assert_eq!(schedule.learning_rate(0.01, 0), 0.01);
    assert_eq!(schedule.learning_rate(0.01, 1000), 0.01);
}

#[test]
fn 기본_스케줄_테스트() {
    let schedule = LearningRateSchedule::default();
    assert_eq!(
        schedule,
        LearningRateSchedule::MultiStep {
            milestones: vec![3, 10, 20, 50, 100],
            gamma: 0.5
        }
    );
}
