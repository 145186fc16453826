//! Tests for the task queues

#[cfg(test)]
mod tests {
    use super::super::{build_pool, DistCivec, DistQueue, DistTask, Request, Task, TaskQueue};
    use crate::civec::Civec;
    use crate::determinants::Determinants;

    struct Square(usize);

    impl Task for Square {
        type Output = usize;

        fn compute(&self) -> usize {
            self.0 * self.0
        }
    }

    #[test]
    fn test_outputs_follow_submission_order() {
        let mut queue = TaskQueue::new();
        queue.extend((0..100).map(Square));
        assert_eq!(queue.len(), 100);
        let out = queue.compute();
        assert_eq!(out, (0..100).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_dedicated_pool() {
        let pool = build_pool(3).unwrap();
        let mut queue = TaskQueue::with_pool(pool);
        for i in 0..10 {
            queue.push(Square(i));
        }
        assert_eq!(queue.compute().iter().sum::<usize>(), 285);
    }

    struct RowSum {
        requests: Vec<Request>,
    }

    impl DistTask for RowSum {
        type Output = f64;

        fn test(&mut self) -> bool {
            self.requests.iter_mut().fold(true, |done, r| r.test() && done)
        }

        fn compute(self) -> f64 {
            self.requests
                .iter()
                .filter_map(|r| r.data())
                .map(|row| row.iter().sum::<f64>())
                .sum()
        }
    }

    #[test]
    fn test_dist_queue_fetches_remote_rows() {
        let det = Determinants::new(5, 2, 1).unwrap();
        let data = (0..det.size()).map(|i| i as f64).collect();
        let civec = Civec::from_data(det.clone(), data);
        let dist = DistCivec::from_civec(&civec, 3);
        assert_eq!(dist.nranks(), 3);
        assert_eq!(dist.owner(0), 0);
        assert_eq!(dist.owner(det.lena() - 1), 2);

        let mut queue = DistQueue::new();
        for ia in 0..det.lena() {
            let rows = [ia, (ia + 4) % det.lena()];
            queue.push(RowSum {
                requests: rows.iter().map(|&r| dist.get_row(r)).collect(),
            });
        }
        let sums = queue.finish();

        for (ia, sum) in sums.iter().enumerate() {
            let expected: f64 = [ia, (ia + 4) % det.lena()]
                .iter()
                .map(|&r| civec.row(r).iter().sum::<f64>())
                .sum();
            assert!((sum - expected).abs() < 1e-12);
        }
    }
}
