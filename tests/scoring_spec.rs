use chrono::{Duration, NaiveDate, Utc};
use speculate2::speculate;
use taskmaster::config::Rules;
use taskmaster::models::*;
use taskmaster::scoring::*;

fn task(id: i64, priority: Priority, category: &str, due_date: Option<NaiveDate>) -> Task {
    let now = Utc::now();
    Task {
        id,
        title: format!("Task {}", id),
        description: String::new(),
        priority,
        category: category.to_string(),
        due_date,
        status: TaskStatus::Open,
        assignee: None,
        created_by_ai: false,
        archived: false,
        created_at: now,
        updated_at: now,
    }
}

speculate! {
    before {
        let today = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
        let scorer = UrgencyScorer::default();
    }

    describe "priority component" {
        it "increases with severity" {
            let scores: Vec<f64> = Priority::ALL.iter().map(|p| priority_component(*p)).collect();
            assert!(scores.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    describe "due component" {
        it "saturates for overdue tasks" {
            let overdue = task(1, Priority::Medium, "other", Some(today - Duration::days(5)));
            let due_today = task(2, Priority::Medium, "other", Some(today));
            assert!(scorer.score(&overdue, today) >= scorer.score(&due_today, today));
            assert_eq!(due_component(Some(today - Duration::days(5)), today), 1.0);
        }

        it "decays as the due date moves out" {
            let near = due_component(Some(today + Duration::days(1)), today);
            let far = due_component(Some(today + Duration::days(30)), today);
            assert!(near > far);
            assert!(far > 0.0);
        }

        it "uses the neutral value when there is no due date" {
            assert_eq!(due_component(None, today), NEUTRAL_DUE);
        }
    }

    describe "score" {
        it "ignores today for undated tasks" {
            let undated = task(1, Priority::High, "technical", None);
            let later = today + Duration::days(400);

            let expected = DUE_WEIGHT * NEUTRAL_DUE
                + PRIORITY_WEIGHT * priority_component(Priority::High)
                + CATEGORY_WEIGHT * scorer.category_component("technical");
            assert_eq!(scorer.score(&undated, today), scorer.score(&undated, later));
            assert!((scorer.score(&undated, today) - expected).abs() < 1e-12);
        }

        it "ranks critical due today above low due in a month" {
            let urgent = task(1, Priority::Critical, "unlisted", Some(today));
            let relaxed = task(2, Priority::Low, "unlisted", Some(today + Duration::days(30)));
            assert!(scorer.score(&urgent, today) > scorer.score(&relaxed, today));
        }

        it "stays within the unit interval" {
            let max = task(1, Priority::Critical, "strategic", Some(today - Duration::days(1)));
            let min = task(2, Priority::Low, "administrative", Some(today + Duration::days(3650)));
            assert!(scorer.score(&max, today) <= 1.0);
            assert!(scorer.score(&min, today) >= 0.0);
        }
    }

    describe "category weights" {
        it "gives unknown categories the default weight" {
            assert_eq!(scorer.category_component("skunkworks"), DEFAULT_CATEGORY_WEIGHT);
        }

        it "matches names case-insensitively" {
            assert_eq!(scorer.category_component("Strategic"), 1.0);
        }

        it "clamps configured weights" {
            let rules = Rules::from_yaml("category_weights:\n  hype: 7.5\n  noise: -2\n").unwrap();
            let scorer = UrgencyScorer::from_rules(&rules);
            assert_eq!(scorer.category_component("hype"), 1.0);
            assert_eq!(scorer.category_component("noise"), 0.0);
        }
    }

    describe "rank" {
        it "orders by score, then due date, then id" {
            let tasks = vec![
                task(1, Priority::Low, "other", None),
                task(2, Priority::Critical, "other", Some(today)),
                task(3, Priority::Medium, "other", Some(today + Duration::days(2))),
                task(4, Priority::Medium, "other", Some(today + Duration::days(2))),
            ];

            let ranked = scorer.rank(tasks, today);
            let ids: Vec<i64> = ranked.iter().map(|r| r.task.id).collect();
            assert_eq!(ids, vec![2, 3, 4, 1]);
            assert!(ranked.windows(2).all(|w| w[0].urgency_score >= w[1].urgency_score));
        }

        it "reports a breakdown that sums to the score" {
            let ranked = scorer.rank(vec![task(1, Priority::High, "review", Some(today))], today);
            let entry = &ranked[0];
            assert!((entry.breakdown.total() - entry.urgency_score).abs() < 1e-12);
        }
    }

    describe "rank_open" {
        it "leaves out done tasks however urgent" {
            let mut finished = task(1, Priority::Critical, "other", Some(today - Duration::days(3)));
            finished.status = TaskStatus::Done;
            let mut waiting = task(2, Priority::Low, "other", None);
            waiting.status = TaskStatus::Delegated;
            let tasks = vec![finished, waiting, task(3, Priority::Medium, "other", None)];

            let ids: Vec<i64> = scorer.rank_open(tasks, today).iter().map(|r| r.task.id).collect();
            assert_eq!(ids, vec![3, 2]);
        }
    }
}
