mod replay_property;
