#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    NormalizingPath,
    LoadingDefinition,
    LoadingBundle,
    LoadingScenes,
    StartingGame,
    Running,
    Unloading,
    Failed,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (Idle, NormalizingPath)
            | (NormalizingPath, LoadingDefinition)
            | (LoadingDefinition, LoadingBundle)
            | (LoadingDefinition, StartingGame)
            | (LoadingBundle, LoadingScenes)
            | (LoadingScenes, StartingGame)
            | (StartingGame, Running)
            | (Running, Unloading)
            | (Idle, Unloading)
            | (Unloading, Idle)
            | (Failed, Idle) => true,
            (Idle | Failed, Failed) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    /// True while a provisioning run or an unload holds the pipeline.
    pub fn is_in_flight(self) -> bool {
        !matches!(
            self,
            LifecycleState::Idle | LifecycleState::Running | LifecycleState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;
    use super::*;

    const ALL: [LifecycleState; 9] = [
        Idle,
        NormalizingPath,
        LoadingDefinition,
        LoadingBundle,
        LoadingScenes,
        StartingGame,
        Running,
        Unloading,
        Failed,
    ];

    #[test]
    fn provisioning_path_only_moves_forward() {
        let path = [
            Idle,
            NormalizingPath,
            LoadingDefinition,
            LoadingBundle,
            LoadingScenes,
            StartingGame,
            Running,
            Unloading,
            Idle,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{pair:?}");
            assert!(!pair[1].can_transition_to(pair[0]) || pair[1] == Idle, "{pair:?}");
        }
        assert!(LoadingDefinition.can_transition_to(StartingGame));
        assert!(!Running.can_transition_to(NormalizingPath));
    }

    #[test]
    fn every_working_state_can_fail_and_failure_returns_to_idle() {
        for state in ALL {
            let expected = !matches!(state, Idle | Failed);
            assert_eq!(state.can_transition_to(Failed), expected, "{state:?}");
        }
        assert!(Failed.can_transition_to(Idle));
        assert!(!Failed.can_transition_to(Running));
    }

    #[test]
    fn in_flight_excludes_resting_states() {
        let in_flight: Vec<_> = ALL.into_iter().filter(|s| s.is_in_flight()).collect();
        assert_eq!(
            in_flight,
            vec![
                NormalizingPath,
                LoadingDefinition,
                LoadingBundle,
                LoadingScenes,
                StartingGame,
                Unloading
            ]
        );
    }
}
